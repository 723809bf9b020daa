//! Configuration validation
//!
//! Field rules come from the `Validate` derive on the blueprint; the
//! cross-field rules below cover what a single field cannot express:
//! - subject labels are distinct and never the reserved `unknown`
//! - command backends have a non-empty argv with the path placeholder
//! - http / webhook publishers carry their required params
//!
//! Destinations may share a folder id; only emptiness is a field rule.

use contracts::{
    CaptureBackend, CatmonError, ClassifierBackend, Label, MonitorBlueprint, NotifyBackend,
    UploadBackend,
};
use validator::Validate;

/// Validate a MonitorBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &MonitorBlueprint) -> Result<(), CatmonError> {
    validate_fields(blueprint)?;
    validate_subjects(blueprint)?;
    validate_capture(blueprint)?;
    validate_classify(blueprint)?;
    validate_upload(blueprint)?;
    validate_notify(blueprint)?;
    Ok(())
}

/// Derived field rules, flattened to the first failing field
fn validate_fields(blueprint: &MonitorBlueprint) -> Result<(), CatmonError> {
    blueprint.validate().map_err(|errors| {
        let (field, message) = first_field_error(&errors);
        CatmonError::config_validation(field, message)
    })
}

fn first_field_error(errors: &validator::ValidationErrors) -> (String, String) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(list) => {
                let message = list
                    .first()
                    .map(|e| match &e.message {
                        Some(m) => m.to_string(),
                        None => format!("failed rule '{}'", e.code),
                    })
                    .unwrap_or_else(|| "invalid value".to_string());
                return (field.to_string(), message);
            }
            ValidationErrorsKind::Struct(inner) => {
                let (sub, message) = first_field_error(inner);
                return (format!("{field}.{sub}"), message);
            }
            ValidationErrorsKind::List(items) => {
                if let Some((idx, inner)) = items.iter().next() {
                    let (sub, message) = first_field_error(inner);
                    return (format!("{field}[{idx}].{sub}"), message);
                }
            }
        }
    }
    ("<root>".to_string(), errors.to_string())
}

fn validate_subjects(blueprint: &MonitorBlueprint) -> Result<(), CatmonError> {
    let routing = &blueprint.routing;

    for (field, profile) in [
        ("routing.subject_a.label", &routing.subject_a),
        ("routing.subject_b.label", &routing.subject_b),
    ] {
        if profile.label == Label::UNKNOWN {
            return Err(CatmonError::config_validation(
                field,
                format!("'{}' is reserved for unrecognised subjects", Label::UNKNOWN),
            ));
        }
    }

    if routing.subject_a.label == routing.subject_b.label {
        return Err(CatmonError::config_validation(
            "routing.subject_b.label",
            format!("duplicate subject label '{}'", routing.subject_b.label),
        ));
    }
    Ok(())
}

fn validate_command(field: &str, argv: &[String], placeholder: &str) -> Result<(), CatmonError> {
    if argv.is_empty() || argv[0].trim().is_empty() {
        return Err(CatmonError::config_validation(
            field,
            "command cannot be empty",
        ));
    }
    if !argv.iter().any(|arg| arg.contains(placeholder)) {
        return Err(CatmonError::config_validation(
            field,
            format!("command must reference {placeholder}"),
        ));
    }
    Ok(())
}

fn validate_capture(blueprint: &MonitorBlueprint) -> Result<(), CatmonError> {
    let capture = &blueprint.capture;
    // Simulated capture never runs the command
    if capture.backend == CaptureBackend::Command && !blueprint.simulation.simulate_capture {
        validate_command("capture.command", &capture.command, "{output}")?;
    }
    Ok(())
}

fn validate_classify(blueprint: &MonitorBlueprint) -> Result<(), CatmonError> {
    let classify = &blueprint.classify;
    if !classify.enabled {
        return Ok(());
    }
    match classify.backend {
        ClassifierBackend::Command => {
            validate_command("classify.command", &classify.command, "{image}")
        }
        ClassifierBackend::Mock => {
            if let Some(raw) = classify.params.get("confidence") {
                let confidence: f64 = raw.parse().map_err(|_| {
                    CatmonError::config_validation(
                        "classify.params.confidence",
                        format!("not a number: '{raw}'"),
                    )
                })?;
                if !(0.0..=1.0).contains(&confidence) {
                    return Err(CatmonError::config_validation(
                        "classify.params.confidence",
                        format!("confidence must be within [0, 1], got {confidence}"),
                    ));
                }
            }
            Ok(())
        }
    }
}

fn require_param(
    section: &str,
    params: &std::collections::HashMap<String, String>,
    key: &str,
) -> Result<(), CatmonError> {
    match params.get(key) {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(CatmonError::config_validation(
            format!("{section}.params.{key}"),
            "required parameter missing",
        )),
    }
}

fn validate_upload(blueprint: &MonitorBlueprint) -> Result<(), CatmonError> {
    let upload = &blueprint.upload;
    if !upload.enabled {
        return Ok(());
    }
    match upload.backend {
        UploadBackend::Folder => require_param("upload", &upload.params, "root"),
        UploadBackend::Http => require_param("upload", &upload.params, "base_url"),
    }
}

fn validate_notify(blueprint: &MonitorBlueprint) -> Result<(), CatmonError> {
    let notify = &blueprint.notify;
    if !notify.enabled {
        return Ok(());
    }
    if notify.account_name.trim().is_empty() {
        return Err(CatmonError::config_validation(
            "notify.account_name",
            "account name cannot be empty",
        ));
    }
    match notify.backend {
        NotifyBackend::Log => Ok(()),
        NotifyBackend::Webhook => require_param("notify", &notify.params, "url"),
    }
}
