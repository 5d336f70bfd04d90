//! `deckhand plugins`

use anyhow::Result;
use deckhand_plugins::LoadReport;

pub fn list(json: bool) -> Result<()> {
    let (resolver, settings) = super::resolve()?;
    let (_, reports) = super::load_plugins(&resolver, &settings);

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", status_line(report));
        }
    }

    Ok(())
}

fn status_line(report: &LoadReport) -> String {
    let marker = if report.loaded { "✓" } else { "✗" };
    format!(
        "{marker} {} ({}) v{}: {}",
        report.name, report.verbose_name, report.version, report.reason
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_line() {
        let report = LoadReport {
            name: "slack".into(),
            verbose_name: "Slack deployment notifications".into(),
            version: "0.1.0".into(),
            loaded: false,
            reason: r#"Required variables not set: ["SLACK_TOKEN"]"#.into(),
        };

        assert_eq!(
            status_line(&report),
            r#"✗ slack (Slack deployment notifications) v0.1.0: Required variables not set: ["SLACK_TOKEN"]"#
        );
    }
}
