//! Run-configuration shapes
//!
//! Declared once through the schema builder and published process-wide by
//! `schema()`. `RunBundle` references `InputsConfig` ahead of its
//! declaration; linking resolves it.

use std::sync::{Arc, OnceLock};

use crate::schema::{
    float_range, min_int, non_negative, one_of, path_like, FieldDefault, Phase, Schema, SchemaBuilder,
    SchemaResult, ShapeBuilder, TypeDescriptor as T, ValidatorFn, Value,
};

pub const RUN_BUNDLE: &str = "RunBundle";
pub const RUN_CONFIG: &str = "RunConfig";
pub const INPUTS_CONFIG: &str = "InputsConfig";
pub const EXPORT_CONFIG: &str = "ExportConfig";
pub const MODEL_SOURCES_CONFIG: &str = "ModelSourcesConfig";
pub const TASKS_CONFIG: &str = "TasksConfig";
pub const THERMO_CONFIG: &str = "ThermoConfig";
pub const GENOMIC_EVIDENCE_CONFIG: &str = "GenomicEvidenceConfig";
pub const SCORING_CONFIG: &str = "ScoringConfig";
pub const GA_CONFIG: &str = "GAConfig";
pub const ESSENTIALITY_CONFIG: &str = "EssentialityConfig";
pub const OMICS_CONFIG: &str = "OmicsConfig";

static SCHEMA: OnceLock<SchemaResult<Schema>> = OnceLock::new();

/// The linked run-configuration schema, built on first use.
pub fn schema() -> SchemaResult<&'static Schema> {
    SCHEMA.get_or_init(|| declare().link()).as_ref().map_err(|err| err.clone())
}

fn texts(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

fn int(shape: ShapeBuilder, name: &str, default: i64) -> ShapeBuilder {
    shape.field_with(name, T::int(), FieldDefault::value(default))
}

fn float(shape: ShapeBuilder, name: &str, default: f64) -> ShapeBuilder {
    shape.field_with(name, T::float(), FieldDefault::value(default))
}

fn flag(shape: ShapeBuilder, name: &str, default: bool) -> ShapeBuilder {
    shape.field_with(name, T::bool(), FieldDefault::value(default))
}

fn optional(shape: ShapeBuilder, name: &str, inner: T) -> ShapeBuilder {
    shape.field(name, T::optional(inner))
}

/// Nested record defaulted from the nested shape's own defaults
fn nested(shape: ShapeBuilder, name: &str, target: &str) -> ShapeBuilder {
    shape.field_with(name, T::record(target), FieldDefault::empty_mapping())
}

fn list_of(shape: ShapeBuilder, name: &str, element: T) -> ShapeBuilder {
    shape.field_with(name, T::sequence(element), FieldDefault::empty_sequence())
}

fn map_of(shape: ShapeBuilder, name: &str, value: T) -> ShapeBuilder {
    shape.field_with(name, T::mapping(T::text(), value), FieldDefault::empty_mapping())
}

/// Literal-set field with a membership check
fn literal(shape: ShapeBuilder, name: &str, allowed: &[&str], default: &str) -> ShapeBuilder {
    shape
        .field_with(name, T::LiteralSet(texts(allowed)), FieldDefault::value(default))
        .validator(format!("{}_allowed", name), &[name], Phase::Post, one_of(texts(allowed)))
}

/// Checks every element of a sequence against a literal set
fn each_one_of(allowed: &[&str]) -> ValidatorFn {
    let check = one_of(texts(allowed));
    Arc::new(move |shape: &str, value: Value| {
        if let Value::Sequence(items) = &value {
            for item in items {
                check(shape, item.clone())?;
            }
        }
        Ok(value)
    })
}

/// Checks every value of a mapping against a literal set
fn values_one_of(allowed: &[&str]) -> ValidatorFn {
    let check = one_of(texts(allowed));
    Arc::new(move |shape: &str, value: Value| {
        if let Value::Mapping(map) = &value {
            for (key, item) in map.iter() {
                check(shape, item.clone()).map_err(|reason| format!("{}: {}", key, reason))?;
            }
        }
        Ok(value)
    })
}

/// `"auto"` or an integer block size
fn auto_or_int() -> ValidatorFn {
    Arc::new(|_shape: &str, value: Value| match &value {
        Value::Null | Value::Int(_) => Ok(value),
        Value::Text(s) if s == "auto" => Ok(value),
        other => Err(format!(
            "expected 'auto' or int, got {}",
            other.to_key().unwrap_or_else(|| other.type_name().to_string())
        )),
    })
}

fn declare() -> SchemaBuilder {
    SchemaBuilder::new()
        .shape(run_bundle())
        .shape(run_config())
        .shape(parallel_config())
        .shape(model_source())
        .shape(reaction_definition())
        .shape(candidate_database())
        .shape(model_filters())
        .shape(model_sources_config())
        .shape(media_config())
        .shape(flux_threshold())
        .shape(output_check())
        .shape(task_constraint())
        .shape(task_definition())
        .shape(tasks_config())
        .shape(thermo_config())
        .shape(evidence_weights())
        .shape(evidence_entry())
        .shape(genomic_evidence_config())
        .shape(penalty_config())
        .shape(fitness_weights())
        .shape(fitness_config())
        .shape(parsimony_config())
        .shape(scoring_config())
        .shape(selection_config())
        .shape(uniform_crossover_config())
        .shape(pathway_aware_config())
        .shape(crossover_config())
        .shape(pathway_mutation_config())
        .shape(adaptive_mutation_config())
        .shape(mutation_config())
        .shape(repair_config())
        .shape(constraints_config())
        .shape(init_population_mix())
        .shape(ga_config())
        .shape(essentiality_config())
        .shape(omics_integration_config())
        .shape(transcriptomics_config())
        .shape(omics_config())
        .shape(export_model_config())
        .shape(reports_config())
        .shape(export_config())
        .shape(inputs_config())
}

fn run_bundle() -> ShapeBuilder {
    let shape = ShapeBuilder::new(RUN_BUNDLE)
        .field("run", T::record(RUN_CONFIG))
        .field("inputs", T::record(INPUTS_CONFIG))
        .field("export", T::record(EXPORT_CONFIG));
    [
        ("model_sources", MODEL_SOURCES_CONFIG),
        ("tasks", TASKS_CONFIG),
        ("thermo", THERMO_CONFIG),
        ("genomic_evidence", GENOMIC_EVIDENCE_CONFIG),
        ("scoring", SCORING_CONFIG),
        ("ga", GA_CONFIG),
        ("essentiality", ESSENTIALITY_CONFIG),
        ("omics", OMICS_CONFIG),
    ]
    .into_iter()
    .fold(shape, |shape, (name, target)| optional(shape, name, T::record(target)))
}

fn run_config() -> ShapeBuilder {
    let shape = ShapeBuilder::new(RUN_CONFIG).field("name", T::text());
    let shape = int(shape, "seed", 42).field("output_dir", T::path());
    let shape = literal(shape, "device", &["cpu", "cuda"], "cpu");
    nested(shape, "parallel", "ParallelConfig").validator("output_dir_path", &["output_dir"], Phase::Pre, path_like())
}

fn parallel_config() -> ShapeBuilder {
    let shape = int(ShapeBuilder::new("ParallelConfig"), "islands", 1);
    let shape = int(shape, "workers_per_island", 1);
    let shape = int(shape, "migration_interval", 20);
    int(shape, "migrants", 1)
        .validator(
            "at_least_one",
            &["islands", "workers_per_island", "migration_interval"],
            Phase::Post,
            min_int(1),
        )
        .validator("at_least_zero", &["migrants"], Phase::Post, min_int(0))
}

fn model_source() -> ShapeBuilder {
    let shape = ShapeBuilder::new("ModelSource").field("path", T::path());
    literal(shape, "kind", &["sbml", "json"], "sbml").validator("path", &["path"], Phase::Pre, path_like())
}

fn reaction_definition() -> ShapeBuilder {
    let shape = ShapeBuilder::new("ReactionDefinition")
        .field("id", T::text())
        .field("stoichiometry", T::mapping(T::text(), T::float()));
    let shape = float(shape, "lb", -1000.0);
    let shape = float(shape, "ub", 1000.0);
    let shape = list_of(shape, "genes", T::text());
    optional(shape, "subsystem", T::text())
}

fn candidate_database() -> ShapeBuilder {
    let shape = list_of(ShapeBuilder::new("CandidateDatabase"), "reactions", T::record("ReactionDefinition"));
    literal(shape, "source", &["bigg", "vmh", "custom"], "custom")
}

fn model_filters() -> ShapeBuilder {
    let shape = flag(ShapeBuilder::new("ModelFilters"), "drop_if_no_genomic_evidence", false);
    flag(shape, "drop_if_far_from_tasks", false)
}

fn model_sources_config() -> ShapeBuilder {
    let shape = ShapeBuilder::new(MODEL_SOURCES_CONFIG)
        .field("template_model", T::record("ModelSource"))
        .field("candidate_database", T::record("CandidateDatabase"));
    nested(shape, "filters", "ModelFilters")
}

fn media_config() -> ShapeBuilder {
    let shape = map_of(ShapeBuilder::new("MediaConfig"), "set_exchange", T::float());
    flag(shape, "close_others", true)
}

fn flux_threshold() -> ShapeBuilder {
    let shape = ShapeBuilder::new("FluxThreshold").field("rxn", T::text());
    let shape = optional(shape, "min", T::float());
    optional(shape, "max", T::float())
}

fn output_check() -> ShapeBuilder {
    list_of(ShapeBuilder::new("OutputCheck"), "flux_thresholds", T::record("FluxThreshold"))
}

fn task_constraint() -> ShapeBuilder {
    let shape = ShapeBuilder::new("TaskConstraint").field("rxn", T::text());
    let shape = optional(shape, "lb", T::float());
    optional(shape, "ub", T::float())
}

fn task_definition() -> ShapeBuilder {
    let shape = ShapeBuilder::new("TaskDefinition").field("id", T::text());
    let shape = literal(shape, "category", &["essential", "basic", "auxiliary"], "basic")
        .field("media", T::record("MediaConfig"))
        .field("objective", T::text());
    let shape = literal(shape, "objective_sense", &["max", "min"], "max");
    let shape = optional(shape, "min_objective_value", T::float());
    let shape = list_of(shape, "constraints", T::record("TaskConstraint"));
    optional(shape, "outputs_check", T::record("OutputCheck"))
}

fn tasks_config() -> ShapeBuilder {
    ShapeBuilder::new(TASKS_CONFIG).field("tasks", T::sequence(T::record("TaskDefinition")))
}

fn thermo_config() -> ShapeBuilder {
    let shape = flag(ShapeBuilder::new(THERMO_CONFIG), "enabled", false);
    let shape = flag(shape, "loopless", false);
    let shape = float(shape, "temperature_K", 310.15);
    let shape = map_of(shape, "currency_pairs", T::sequence(T::text()));
    let shape = literal(
        shape,
        "infeasible_action",
        &["penalize", "repair_only", "penalize_and_repair"],
        "penalize",
    );
    float(shape, "loop_penalty", 0.0)
}

fn evidence_weights() -> ShapeBuilder {
    let shape = float(ShapeBuilder::new("EvidenceWeights"), "annotation", 1.0);
    ["homology", "phylogeny", "transcript_support", "proteome_support"]
        .into_iter()
        .fold(shape, |shape, name| float(shape, name, 0.0))
}

fn evidence_entry() -> ShapeBuilder {
    let shape = ShapeBuilder::new("EvidenceEntry").field("reaction_id", T::text());
    let shape = flag(shape, "annotation", false);
    let shape = ["homology_bitscore", "phylogeny_distance", "transcript_tpm"]
        .into_iter()
        .fold(shape, |shape, name| optional(shape, name, T::float()));
    optional(shape, "protein_detected", T::bool())
}

fn genomic_evidence_config() -> ShapeBuilder {
    let shape = nested(ShapeBuilder::new(GENOMIC_EVIDENCE_CONFIG), "weights", "EvidenceWeights");
    list_of(shape, "entries", T::record("EvidenceEntry"))
}

fn penalty_config() -> ShapeBuilder {
    let shape = float(ShapeBuilder::new("PenaltyConfig"), "hard_constraint_violation", 0.0);
    float(shape, "minor_violation", 0.0)
}

fn fitness_weights() -> ShapeBuilder {
    let shape = float(ShapeBuilder::new("FitnessWeights"), "task", 1.0);
    ["parsimony", "genomic", "thermo"]
        .into_iter()
        .fold(shape, |shape, name| float(shape, name, 0.0))
}

fn fitness_config() -> ShapeBuilder {
    let shape = literal(ShapeBuilder::new("FitnessConfig"), "mode", &["weighted_sum", "pareto"], "weighted_sum");
    let shape = nested(shape, "weights", "FitnessWeights");
    nested(shape, "penalties", "PenaltyConfig")
}

fn parsimony_config() -> ShapeBuilder {
    let shape = literal(
        ShapeBuilder::new("ParsimonyConfig"),
        "target",
        &["min_reactions", "min_added", "min_total_flux"],
        "min_reactions",
    );
    flag(shape, "normalize_by_template_size", false)
}

fn scoring_config() -> ShapeBuilder {
    let shape = nested(ShapeBuilder::new(SCORING_CONFIG), "fitness", "FitnessConfig");
    nested(shape, "parsimony", "ParsimonyConfig")
}

fn selection_config() -> ShapeBuilder {
    let shape = literal(
        ShapeBuilder::new("SelectionConfig"),
        "type",
        &["tournament", "roulette", "rank"],
        "tournament",
    );
    let shape = int(shape, "k", 3);
    int(shape, "elitism", 0)
}

fn uniform_crossover_config() -> ShapeBuilder {
    let shape = literal(ShapeBuilder::new("UniformCrossoverConfig"), "type", &["uniform"], "uniform");
    float(shape, "p", 0.5).validator("probability", &["p"], Phase::Post, float_range(0.0, 1.0))
}

fn pathway_aware_config() -> ShapeBuilder {
    let shape = flag(ShapeBuilder::new("PathwayAwareConfig"), "enabled", false);
    optional(shape, "block_size", T::any()).validator("auto_or_int", &["block_size"], Phase::Post, auto_or_int())
}

fn crossover_config() -> ShapeBuilder {
    let shape = nested(ShapeBuilder::new("CrossoverConfig"), "template_region", "UniformCrossoverConfig");
    let shape = nested(shape, "database_region", "UniformCrossoverConfig");
    nested(shape, "pathway_aware", "PathwayAwareConfig")
}

fn pathway_mutation_config() -> ShapeBuilder {
    let shape = flag(ShapeBuilder::new("PathwayMutationConfig"), "enabled", false);
    float(shape, "p_pathway", 0.0)
}

fn adaptive_mutation_config() -> ShapeBuilder {
    let shape = int(ShapeBuilder::new("AdaptiveMutationConfig"), "stagnation_window", 10);
    let shape = float(shape, "scale_up", 1.0);
    float(shape, "max_bitflip_p", 0.05)
}

fn mutation_config() -> ShapeBuilder {
    let shape = float(ShapeBuilder::new("MutationConfig"), "bitflip_p", 0.0);
    let shape = nested(shape, "pathway_mutation", "PathwayMutationConfig");
    nested(shape, "adaptive", "AdaptiveMutationConfig")
}

fn repair_config() -> ShapeBuilder {
    let shape = flag(ShapeBuilder::new("RepairConfig"), "milp_min_additions", false);
    let shape = flag(shape, "loopless_check", false);
    optional(shape, "max_milp_time_s", T::int())
}

fn constraints_config() -> ShapeBuilder {
    let shape = list_of(ShapeBuilder::new("ConstraintsConfig"), "enforce_task_pass_for", T::text());
    nested(shape, "repair", "RepairConfig")
}

fn init_population_mix() -> ShapeBuilder {
    let fractions = ["random", "conservative_template_keep", "evidence_only", "minimal_task_only"];
    let shape = float(ShapeBuilder::new("InitPopulationMix"), "random", 1.0);
    fractions[1..]
        .iter()
        .fold(shape, |shape, name| float(shape, name, 0.0))
        .validator("mix_fraction", &fractions, Phase::Post, non_negative())
}

fn ga_config() -> ShapeBuilder {
    let shape = int(ShapeBuilder::new(GA_CONFIG), "population", 100);
    let shape = int(shape, "generations", 100);
    [
        ("selection", "SelectionConfig"),
        ("crossover", "CrossoverConfig"),
        ("mutation", "MutationConfig"),
        ("constraints", "ConstraintsConfig"),
        ("init_population_mix", "InitPopulationMix"),
    ]
    .into_iter()
    .fold(shape, |shape, (name, target)| nested(shape, name, target))
}

fn essentiality_config() -> ShapeBuilder {
    let truth = ["essential", "nonessential"];
    map_of(
        ShapeBuilder::new(ESSENTIALITY_CONFIG),
        "model_gene_to_truth",
        T::LiteralSet(texts(&truth)),
    )
    .validator("truth_label", &["model_gene_to_truth"], Phase::Post, values_one_of(&truth))
}

fn omics_integration_config() -> ShapeBuilder {
    let shape = literal(
        ShapeBuilder::new("OmicsIntegrationConfig"),
        "method",
        &["GIMME", "iMAT", "GIM3E"],
        "GIMME",
    );
    map_of(shape, "thresholds", T::float())
}

fn transcriptomics_config() -> ShapeBuilder {
    let shape = ShapeBuilder::new("TranscriptomicsConfig")
        .field("file", T::path())
        .field("gene_col", T::text())
        .field("value_col", T::text());
    optional(shape, "condition", T::text()).validator("file_path", &["file"], Phase::Pre, path_like())
}

fn omics_config() -> ShapeBuilder {
    let shape = optional(ShapeBuilder::new(OMICS_CONFIG), "transcriptomics", T::record("TranscriptomicsConfig"));
    optional(shape, "integration", T::record("OmicsIntegrationConfig"))
}

fn export_model_config() -> ShapeBuilder {
    let formats = ["sbml", "json"];
    ShapeBuilder::new("ExportModelConfig")
        .field_with(
            "formats",
            T::sequence(T::LiteralSet(texts(&formats))),
            FieldDefault::factory(|| Value::Sequence(vec![Value::from("sbml")])),
        )
        .field("path", T::path())
        .validator("format_allowed", &["formats"], Phase::Post, each_one_of(&formats))
        .validator("path", &["path"], Phase::Pre, path_like())
}

fn reports_config() -> ShapeBuilder {
    let shape = flag(ShapeBuilder::new("ReportsConfig"), "html", true);
    flag(shape, "json", true)
}

fn export_config() -> ShapeBuilder {
    let shape = ShapeBuilder::new(EXPORT_CONFIG).field("best_model", T::record("ExportModelConfig"));
    nested(shape, "reports", "ReportsConfig")
}

fn inputs_config() -> ShapeBuilder {
    let required = ["model_sources", "tasks", "ga", "thermo", "genomic_evidence", "scoring"];
    let optional_inputs = ["omics", "essentiality"];
    let shape = required
        .into_iter()
        .fold(ShapeBuilder::new(INPUTS_CONFIG), |shape, name| shape.field(name, T::path()));
    let shape = optional_inputs
        .into_iter()
        .fold(shape, |shape, name| optional(shape, name, T::path()));
    let all: Vec<&str> = required.iter().chain(optional_inputs.iter()).copied().collect();
    shape.validator("input_paths", &all, Phase::Pre, path_like())
}
