//! Job admission.
//!
//! Validates a job message against the worker's parameter declarations
//! before any processing callback runs.

use std::collections::HashSet;

use tracing::debug;

use mworker_models::{Job, JobParameters, ParameterKind, ParameterSpec};

use crate::error::{WorkerError, WorkerResult};

/// Check a worker's own declarations: unique identifiers, at least one kind each.
pub fn validate_declarations(specs: &[ParameterSpec]) -> WorkerResult<()> {
    let mut seen = HashSet::new();
    for spec in specs {
        if spec.identifier.is_empty() {
            return Err(WorkerError::InvalidDeclaration(
                "parameter identifier cannot be empty".to_string(),
            ));
        }
        if !seen.insert(spec.identifier.as_str()) {
            return Err(WorkerError::InvalidDeclaration(format!(
                "duplicate parameter identifier '{}'",
                spec.identifier
            )));
        }
        if spec.kind.is_empty() {
            return Err(WorkerError::InvalidDeclaration(format!(
                "parameter '{}' declares no kind",
                spec.identifier
            )));
        }
    }
    Ok(())
}

/// Validate a job against the declarations and resolve its parameter values.
pub fn admit(specs: &[ParameterSpec], job: &Job) -> WorkerResult<JobParameters> {
    let mut admitted = JobParameters::new();

    for parameter in &job.parameters {
        let kind: ParameterKind =
            parameter
                .kind
                .parse()
                .map_err(|_| WorkerError::UnrecognizedKind {
                    identifier: parameter.id.clone(),
                    kind: parameter.kind.clone(),
                })?;

        if admitted.contains(&parameter.id) {
            return Err(WorkerError::invalid_parameter(
                &parameter.id,
                "provided more than once",
            ));
        }

        let spec = specs.iter().find(|s| s.identifier == parameter.id);
        match spec {
            Some(spec) if !spec.accepts_kind(kind) => {
                let expected: Vec<&str> = spec.kind.iter().map(ParameterKind::as_str).collect();
                return Err(WorkerError::invalid_parameter(
                    &parameter.id,
                    format!("kind '{}' is not one of [{}]", kind, expected.join(", ")),
                ));
            }
            Some(_) => {}
            None => debug!(parameter = %parameter.id, "Parameter not declared by the worker"),
        }

        let Some(value) = parameter.effective_value() else {
            continue;
        };

        if !kind.accepts(value) {
            return Err(WorkerError::invalid_parameter(
                &parameter.id,
                format!("value does not match kind '{}'", kind),
            ));
        }

        admitted.insert(parameter.id.clone(), kind, value.clone());
    }

    if let Some(missing) = specs
        .iter()
        .find(|spec| spec.required && !admitted.contains(&spec.identifier))
    {
        return Err(WorkerError::MissingParameter(missing.identifier.clone()));
    }

    Ok(admitted)
}

/// Check that every path listed by `requirements` parameters exists.
pub fn check_requirements(parameters: &JobParameters) -> WorkerResult<()> {
    let missing: Vec<String> = parameters
        .requirement_paths()
        .into_iter()
        .filter(|path| !path.exists())
        .map(|path| path.display().to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(WorkerError::RequirementsNotMet(format!(
            "missing paths: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mworker_models::{JobId, JobParameter};
    use serde_json::json;

    fn specs() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::new("source_path", "Source path", [ParameterKind::String]).required(),
            ParameterSpec::new("destination_path", "Destination path", [ParameterKind::String]),
        ]
    }

    fn job(parameters: Vec<JobParameter>) -> Job {
        Job {
            job_id: JobId(123),
            parameters,
        }
    }

    #[test]
    fn test_missing_required_parameter() {
        let job = job(vec![JobParameter::new(
            "destination_path",
            ParameterKind::String,
            json!("/out.mxf"),
        )]);
        assert!(matches!(
            admit(&specs(), &job),
            Err(WorkerError::MissingParameter(id)) if id == "source_path"
        ));
    }

    #[test]
    fn test_required_parameter_with_default_only() {
        let job = Job::new(
            r#"{"job_id": 1, "parameters": [
                {"id": "source_path", "type": "string", "default": "/in.mxf"}
            ]}"#,
        )
        .unwrap();
        let admitted = admit(&specs(), &job).unwrap();
        assert_eq!(admitted.get_string("source_path").as_deref(), Some("/in.mxf"));
    }

    #[test]
    fn test_null_value_counts_as_missing() {
        let job = Job::new(
            r#"{"job_id": 1, "parameters": [
                {"id": "source_path", "type": "string", "value": null}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(
            admit(&specs(), &job),
            Err(WorkerError::MissingParameter(_))
        ));
    }

    #[test]
    fn test_unrecognized_kind() {
        let job = Job::new(
            r#"{"job_id": 1, "parameters": [
                {"id": "source_path", "type": "video_file", "value": "/in.mxf"}
            ]}"#,
        )
        .unwrap();
        let err = admit(&specs(), &job).unwrap_err();
        assert!(matches!(err, WorkerError::UnrecognizedKind { .. }));
        assert!(err.is_admission());
    }

    #[test]
    fn test_kind_not_declared_for_parameter() {
        let job = job(vec![JobParameter::new(
            "source_path",
            ParameterKind::Integer,
            json!(12),
        )]);
        assert!(matches!(
            admit(&specs(), &job),
            Err(WorkerError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_value_shape_mismatch() {
        let job = job(vec![JobParameter::new(
            "source_path",
            ParameterKind::String,
            json!(12),
        )]);
        assert!(admit(&specs(), &job).is_err());
    }

    #[test]
    fn test_undeclared_parameters_are_kept() {
        let job = job(vec![
            JobParameter::new("source_path", ParameterKind::String, json!("/in.mxf")),
            JobParameter::new("extra", ParameterKind::Boolean, json!(true)),
        ]);
        let admitted = admit(&specs(), &job).unwrap();
        assert_eq!(admitted.len(), 2);
        assert_eq!(admitted.get_boolean("extra"), Some(true));
    }

    #[test]
    fn test_duplicate_declarations() {
        let mut declarations = specs();
        declarations.push(ParameterSpec::new("source_path", "again", [ParameterKind::String]));
        assert!(matches!(
            validate_declarations(&declarations),
            Err(WorkerError::InvalidDeclaration(_))
        ));
        assert!(validate_declarations(&specs()).is_ok());
    }

    #[test]
    fn test_requirements() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut parameters = JobParameters::new();
        parameters.insert(
            "requirements",
            ParameterKind::Requirements,
            json!({ "paths": [file.path().to_str().unwrap()] }),
        );
        assert!(check_requirements(&parameters).is_ok());

        parameters.insert(
            "requirements",
            ParameterKind::Requirements,
            json!({ "paths": ["nonexistent_file"] }),
        );
        assert!(matches!(
            check_requirements(&parameters),
            Err(WorkerError::RequirementsNotMet(_))
        ));
    }
}
