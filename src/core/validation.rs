/// Story validation — syntax checks, structural parse, lint warnings and
/// the reachability certificate a story needs before it is playable.

use log::info;
use serde::{Deserialize, Serialize};

use crate::core::blocks::{extract_section, first_token, section_body, strip_comments};
use crate::core::config::EngineConfig;
use crate::core::grounding::{unsatisfiable_parameters, TypeFallback};
use crate::core::parser::{parse, Document};
use crate::core::reachability::{check_story, Reachability};
use crate::schema::story::Story;

/// Everything found while validating a story.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Present once the story parsed cleanly.
    pub reachability: Option<Reachability>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a domain/problem pair. Deeper checks only run when the
/// earlier ones found no errors.
pub fn validate(domain_text: &str, problem_text: &str, config: &EngineConfig) -> ValidationReport {
    let mut report = ValidationReport {
        errors: syntax_errors(domain_text, problem_text),
        ..ValidationReport::default()
    };
    if !report.errors.is_empty() {
        return report;
    }

    let story = match parse(domain_text, problem_text) {
        Ok(story) => story,
        Err(errors) => {
            report.errors.extend(errors.iter().map(ToString::to_string));
            return report;
        }
    };

    lint(&story, config, &mut report);
    if !report.errors.is_empty() {
        return report;
    }

    let reachability = check_story(&story, config.search, &config.grounding);
    if !reachability.reachable() {
        report.errors.push(reachability.message.clone());
    } else if reachability.is_inconclusive() {
        report.warnings.push(reachability.message.clone());
    }
    report.reachability = Some(reachability);

    info!(
        "validated story {:?}: {} errors, {} warnings",
        story.problem.name,
        report.errors.len(),
        report.warnings.len()
    );
    report
}

fn header(text: &str, marker: &str) -> Option<String> {
    extract_section(text, marker)
        .ok()
        .and_then(|block| first_token(section_body(block, marker)))
        .map(str::to_string)
}

/// Header and parenthesis-balance checks on the raw texts.
pub fn syntax_errors(domain_text: &str, problem_text: &str) -> Vec<String> {
    let mut errors = Vec::new();
    let domain = strip_comments(domain_text);
    let problem = strip_comments(problem_text);

    for (document, text, marker) in [
        (Document::Domain, &domain, "domain"),
        (Document::Problem, &problem, "problem"),
    ] {
        if !text.trim_start().starts_with("(define") {
            errors.push(format!("{document} must start with '(define'"));
        }
        if header(text, marker).is_none() {
            errors.push(format!("{document} must contain ({marker} <name>)"));
        }
    }
    if header(&problem, ":domain").is_none() {
        errors.push("problem must reference a domain with (:domain <name>)".to_string());
    }

    for (document, text) in [(Document::Domain, &domain), (Document::Problem, &problem)] {
        let opens = text.matches('(').count();
        let closes = text.matches(')').count();
        if opens != closes {
            errors.push(format!(
                "unbalanced parentheses in {document}: {opens} '(' vs {closes} ')'"
            ));
        }
    }
    errors
}

/// Semantic checks on a parsed story.
fn lint(story: &Story, config: &EngineConfig, report: &mut ValidationReport) {
    let domain = &story.domain;
    let problem = &story.problem;

    if domain.actions().is_empty() {
        report.warnings.push("domain declares no actions".to_string());
    }
    for name in &domain.redefined {
        report
            .warnings
            .push(format!("action '{name}' is declared more than once; the last declaration wins"));
    }
    if let (Some(declared), Some(referenced)) = (&domain.name, &problem.domain_name) {
        if declared != referenced {
            report.warnings.push(format!(
                "problem references domain '{referenced}' but the domain is named '{declared}'"
            ));
        }
    }
    if problem.goal.is_empty() {
        report.warnings.push("goal is empty and holds immediately".to_string());
    }

    if !domain.predicates.is_empty() {
        for schema in domain.actions() {
            for literal in schema.effect.literals() {
                if !domain.declares_predicate(&literal.predicate) {
                    report.warnings.push(format!(
                        "action '{}' affects undeclared predicate '{}'",
                        schema.name, literal.predicate
                    ));
                }
            }
        }
        for fact in &problem.init {
            if !domain.declares_predicate(fact.predicate()) {
                report
                    .warnings
                    .push(format!("initial fact '({fact})' uses an undeclared predicate"));
            }
        }
    }

    let untyped = unsatisfiable_parameters(domain, &problem.objects);
    match config.grounding.type_fallback {
        TypeFallback::Strict => report.errors.extend(untyped.iter().map(ToString::to_string)),
        TypeFallback::Permissive => report.warnings.extend(
            untyped
                .iter()
                .map(|e| format!("{e}; every object will be tried")),
        ),
    }
}
