//! Argv construction for the scanner and the container runtime.
//!
//! Every command is an explicit program-plus-arguments list; nothing here
//! is ever handed to a shell. The image reference is scrubbed before it
//! lands in an argv.

use outpost_common::sanitize_image_ref;

/// A fully built external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ExternalCommand {
    fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args,
        }
    }

    /// Space-joined rendering for log lines.
    #[must_use]
    pub fn display_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// `trivy image --security-checks <checks> --severity <severity> --format json <image>`
#[must_use]
pub fn image_scan(trivy: &str, image: &str, severity: &str, checks: &str) -> ExternalCommand {
    ExternalCommand::new(
        trivy,
        vec![
            "image".to_string(),
            "--security-checks".to_string(),
            checks.to_string(),
            "--severity".to_string(),
            severity.to_string(),
            "--format".to_string(),
            "json".to_string(),
            sanitize_image_ref(image),
        ],
    )
}

/// `trivy image --format <format> <image>`
#[must_use]
pub fn sbom_export(trivy: &str, image: &str, format: &str) -> ExternalCommand {
    ExternalCommand::new(
        trivy,
        vec![
            "image".to_string(),
            "--format".to_string(),
            format.to_string(),
            sanitize_image_ref(image),
        ],
    )
}

/// `trivy image --security-checks <checks> --format json <image>`, with no
/// severity filter so every misconfiguration level comes back.
#[must_use]
pub fn config_scan(trivy: &str, image: &str, checks: &str) -> ExternalCommand {
    ExternalCommand::new(
        trivy,
        vec![
            "image".to_string(),
            "--security-checks".to_string(),
            checks.to_string(),
            "--format".to_string(),
            "json".to_string(),
            sanitize_image_ref(image),
        ],
    )
}

/// `docker images --format {{json .}}`, one JSON object per line. The Go
/// template is a single argv element, never quoted for a shell.
#[must_use]
pub fn list_images(docker: &str) -> ExternalCommand {
    ExternalCommand::new(
        docker,
        vec![
            "images".to_string(),
            "--format".to_string(),
            "{{json .}}".to_string(),
        ],
    )
}

/// `docker ps -a --format {{json .}}`, stopped containers included.
#[must_use]
pub fn list_containers(docker: &str) -> ExternalCommand {
    ExternalCommand::new(
        docker,
        vec![
            "ps".to_string(),
            "-a".to_string(),
            "--format".to_string(),
            "{{json .}}".to_string(),
        ],
    )
}
