//! `route` command implementation.
//!
//! Renders the routing decision for a hand-written classification so the
//! routing table can be checked without the camera or the classifier.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use contracts::{ClassificationResult, ImageId, RoutingDecision};
use pipeline::RoutingPolicy;
use serde::Serialize;
use tracing::info;

use crate::cli::RouteArgs;
use crate::error::CliError;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Serialize)]
struct RoutePreview<'a> {
    label: Option<&'a str>,
    folder: &'a str,
    folder_id: &'a str,
    notification_text: &'a str,
}

/// Execute the `route` command
pub fn run_route(args: &RouteArgs) -> Result<()> {
    let blueprint = super::load_blueprint(&args.config)?;
    let at = match args.at.as_deref() {
        Some(value) => parse_time(value)?,
        None => Local::now(),
    };
    info!(label = ?args.label, at = %at, "Previewing route");

    let decision = preview(RoutingPolicy::new(blueprint.routing), args, at)?;

    if args.json {
        let preview = RoutePreview {
            label: args.label.as_deref(),
            folder: &decision.destination.name,
            folder_id: &decision.destination.id,
            notification_text: &decision.notification_text,
        };
        let json =
            serde_json::to_string_pretty(&preview).context("Failed to serialize route preview")?;
        println!("{}", json);
    } else {
        println!(
            "Folder: {} [{}]\n",
            decision.destination.name, decision.destination.id
        );
        println!("{}", decision.notification_text);
    }
    Ok(())
}

fn preview(
    policy: RoutingPolicy,
    args: &RouteArgs,
    at: DateTime<Local>,
) -> Result<RoutingDecision> {
    let classification = args
        .label
        .as_ref()
        .map(|label| ClassificationResult::new(label.as_str(), args.confidence, args.model.as_str()));
    let image = ImageId::from(args.image.clone());
    let decision = policy.route(classification.as_ref(), &image, at)?;
    Ok(decision)
}

/// Local wall-clock time in `YYYY-MM-DD HH:MM`
fn parse_time(value: &str) -> Result<DateTime<Local>, CliError> {
    let naive = NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|e| CliError::invalid_time(value, e.to_string()))?;
    naive
        .and_local_timezone(Local)
        .earliest()
        .ok_or_else(|| CliError::invalid_time(value, "does not exist in the local time zone"))
}
