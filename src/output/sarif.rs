use crate::catalog;
use crate::finding::{BundleReport, FileReport, QuarantineAction};
use serde_sarif::sarif::{
    ArtifactLocation, Location, Message, MultiformatMessageString, PhysicalLocation, Region,
    ReportingDescriptor, Result as SarifResult, ResultLevel, Run, Sarif, Tool, ToolComponent,
};
use std::collections::{BTreeMap, HashMap};

/// Rule ids for decisions that do not come from a catalog pattern.
const BLOCKLIST_RULE: (&str, &str, &str) = (
    "blocklist",
    "Content matches a policy blocklist literal",
    "Remove the blocked literal or adjust the policy blocklist",
);
const FILE_SIZE_RULE: (&str, &str, &str) = (
    "file-size",
    "File exceeds the policy size limit and was not read",
    "Split the file or raise max_file_size after manual review",
);

pub fn format(report: &BundleReport) -> String {
    let mut results: Vec<(&'static str, SarifResult)> = Vec::new();
    for file in report.flagged() {
        collect_results(file, &mut results);
    }

    // Rule descriptors for every id referenced, sorted for stable indices.
    let mut rule_text: BTreeMap<&str, (String, String)> = BTreeMap::new();
    for (id, _) in &results {
        rule_text.entry(*id).or_insert_with(|| describe_rule(id));
    }

    let rule_index: HashMap<&str, i64> = rule_text
        .keys()
        .enumerate()
        .map(|(i, id)| (*id, i as i64))
        .collect();

    let rules: Vec<ReportingDescriptor> = rule_text
        .iter()
        .map(|(id, (description, remediation))| {
            let mut rule = ReportingDescriptor::builder().id(id.to_string()).build();
            rule.short_description = Some(
                MultiformatMessageString::builder()
                    .text(description.clone())
                    .build(),
            );
            rule.help = Some(
                MultiformatMessageString::builder()
                    .text(remediation.clone())
                    .build(),
            );
            rule
        })
        .collect();

    let results: Vec<SarifResult> = results
        .into_iter()
        .map(|(id, mut result)| {
            result.rule_index = rule_index.get(id).copied();
            result
        })
        .collect();

    let driver = ToolComponent::builder()
        .name("skill-quarantine")
        .version(env!("CARGO_PKG_VERSION").to_string())
        .rules(rules)
        .build();

    let tool = Tool::builder().driver(driver).build();

    let run = Run::builder().tool(tool).results(results).build();

    let sarif = Sarif::builder().version("2.1.0").runs(vec![run]).build();

    serde_json::to_string_pretty(&sarif).expect("SARIF serialization failed")
}

/// One SARIF result per rule hit; blocklist and size decisions get one
/// result each.
fn collect_results(file: &FileReport, out: &mut Vec<(&'static str, SarifResult)>) {
    let reason = file.result.action.reason().unwrap_or("Pattern recorded");

    for hit in &file.result.hits {
        let name = catalog::rule(hit.pattern).map_or(hit.pattern, |p| p.name);
        out.push((
            hit.pattern,
            build_result(
                hit.pattern,
                format!("{name}: {reason}"),
                file,
                Some(hit.line),
            ),
        ));
    }

    if !file.result.hits.is_empty() {
        return;
    }

    match &file.result.action {
        QuarantineAction::Block { matched, .. } => {
            let line = file.result.matched_lines.first().copied();
            out.push((
                BLOCKLIST_RULE.0,
                build_result(
                    BLOCKLIST_RULE.0,
                    format!("{reason}: {matched}"),
                    file,
                    line,
                ),
            ));
        }
        QuarantineAction::Quarantine { .. } => {
            out.push((
                FILE_SIZE_RULE.0,
                build_result(FILE_SIZE_RULE.0, reason.to_string(), file, None),
            ));
        }
        QuarantineAction::Allow { .. } => {}
    }
}

fn build_result(
    rule_id: &str,
    message: String,
    file: &FileReport,
    line: Option<usize>,
) -> SarifResult {
    let mut result = SarifResult::builder()
        .message(Message::builder().text(message).build())
        .build();

    result.rule_id = Some(rule_id.to_string());
    result.level = Some(match file.result.action {
        QuarantineAction::Block { .. } => ResultLevel::Error,
        QuarantineAction::Quarantine { .. } => ResultLevel::Warning,
        QuarantineAction::Allow { .. } => ResultLevel::Note,
    });

    let uri = file.path.to_string_lossy().replace('\\', "/");
    let mut location = Location::builder().build();
    let mut physical = PhysicalLocation::builder().build();
    physical.artifact_location = Some(ArtifactLocation::builder().uri(uri).build());
    if let Some(line) = line {
        physical.region = Some(Region::builder().start_line(line as i64).build());
    }
    location.physical_location = Some(physical);
    result.locations = Some(vec![location]);

    result
}

fn describe_rule(id: &str) -> (String, String) {
    if let Some(pattern) = catalog::rule(id) {
        return (
            pattern.description.to_string(),
            pattern.remediation.to_string(),
        );
    }
    let (_, description, remediation) = if id == BLOCKLIST_RULE.0 {
        BLOCKLIST_RULE
    } else {
        FILE_SIZE_RULE
    };
    (description.to_string(), remediation.to_string())
}
