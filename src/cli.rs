// CLI surface for driving the submission workflow and reorder protocol
// against a running backend.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::cache::Cache;
use crate::model::{FindingDraft, OwaspCategory, PendingImage, RiskLevel};
use crate::ordering::{sorted_view, FindingOrderCoordinator, MoveDirection, MoveOutcome};
use crate::owasp::apply_owasp_autofill;
use crate::remote::RemoteStore;
use crate::workflow::{FindingSubmissionWorkflow, Navigator, UploadReport, WorkflowError};

#[derive(Parser)]
#[command(name = "pentest-findings")]
#[command(about = "Pentest report finding submission and ordering")]
#[command(long_about = "Create, edit and reorder findings on a pentest report, \
                       upload proof-of-concept images alongside a submission, and \
                       promote finished findings into the knowledge base.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a report with its findings in display order
    Show {
        /// Report to display
        #[arg(long)]
        report: u64,
    },
    /// Create a finding on a report, uploading any images in the same pass
    Create {
        #[arg(long)]
        report: u64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Risk level: critical, high, medium, low, info
        #[arg(long, default_value = "medium")]
        risk: String,
        /// OWASP Top 10 2021 category, e.g. injection or broken_access_control
        #[arg(long)]
        owasp: Option<String>,
        #[arg(long)]
        affected_area: Option<String>,
        #[arg(long)]
        impact: Option<String>,
        #[arg(long)]
        solution: Option<String>,
        #[arg(long)]
        steps: Option<String>,
        #[arg(long)]
        cvss_score: Option<String>,
        #[arg(long)]
        cwe_id: Option<String>,
        #[arg(long)]
        refs: Option<String>,
        /// Proof-of-concept image file, repeatable
        #[arg(long = "image")]
        images: Vec<PathBuf>,
        /// Fill CWE and CVSS vector from the selected OWASP category
        #[arg(long)]
        autofill: bool,
        /// Promote the new finding into the knowledge base
        #[arg(long, conflicts_with = "add_another")]
        save_to_kb: bool,
        /// Resolve the promotion decision by looping back to a fresh draft
        #[arg(long)]
        add_another: bool,
    },
    /// Edit an existing finding; unset fields keep their current value
    Edit {
        #[arg(long)]
        finding: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        risk: Option<String>,
        #[arg(long)]
        owasp: Option<String>,
        #[arg(long)]
        affected_area: Option<String>,
        #[arg(long)]
        impact: Option<String>,
        #[arg(long)]
        solution: Option<String>,
        #[arg(long)]
        steps: Option<String>,
        #[arg(long)]
        cvss_score: Option<String>,
        #[arg(long)]
        cwe_id: Option<String>,
        #[arg(long)]
        refs: Option<String>,
        /// Additional proof-of-concept image file, repeatable
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },
    /// Move a finding one position up or down within its report
    Move {
        #[arg(long)]
        report: u64,
        #[arg(long)]
        finding: u64,
        /// Direction: up or down
        #[arg(long)]
        direction: String,
    },
    /// Delete a finding
    Delete {
        #[arg(long)]
        finding: u64,
    },
    /// Delete a persisted proof-of-concept image
    DeleteImage {
        #[arg(long)]
        image: u64,
    },
}

pub fn parse_risk(value: &str) -> Result<RiskLevel> {
    match value.to_ascii_lowercase().as_str() {
        "critical" => Ok(RiskLevel::Critical),
        "high" => Ok(RiskLevel::High),
        "medium" => Ok(RiskLevel::Medium),
        "low" => Ok(RiskLevel::Low),
        "info" => Ok(RiskLevel::Info),
        other => Err(anyhow!(
            "unknown risk level '{other}', expected critical|high|medium|low|info"
        )),
    }
}

pub fn parse_owasp(value: &str) -> Result<OwaspCategory> {
    match value.to_ascii_lowercase().as_str() {
        "broken_access_control" => Ok(OwaspCategory::BrokenAccessControl),
        "cryptographic_failures" => Ok(OwaspCategory::CryptographicFailures),
        "injection" => Ok(OwaspCategory::Injection),
        "insecure_design" => Ok(OwaspCategory::InsecureDesign),
        "security_misconfiguration" => Ok(OwaspCategory::SecurityMisconfiguration),
        "vulnerable_components" => Ok(OwaspCategory::VulnerableComponents),
        "authentication_failures" => Ok(OwaspCategory::AuthenticationFailures),
        "software_integrity_failures" => Ok(OwaspCategory::SoftwareIntegrityFailures),
        "logging_monitoring_failures" => Ok(OwaspCategory::LoggingMonitoringFailures),
        "ssrf" => Ok(OwaspCategory::Ssrf),
        other => Err(anyhow!("unknown OWASP category '{other}'")),
    }
}

pub fn parse_direction(value: &str) -> Result<MoveDirection> {
    match value.to_ascii_lowercase().as_str() {
        "up" => Ok(MoveDirection::Up),
        "down" => Ok(MoveDirection::Down),
        other => Err(anyhow!("unknown direction '{other}', expected up|down")),
    }
}

async fn load_images(paths: &[PathBuf]) -> Result<Vec<PendingImage>> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read image {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        images.push(PendingImage::new(bytes, filename));
    }
    Ok(images)
}

fn report_upload(upload: &UploadReport) {
    if upload.is_degraded() {
        println!(
            "warning: {} of {} image uploads failed; the finding was saved",
            upload.failed, upload.attempted
        );
    } else if upload.attempted > 0 {
        println!("uploaded {} image(s)", upload.attempted);
    }
}

pub async fn run(
    command: Commands,
    store: Arc<dyn RemoteStore>,
    cache: Arc<dyn Cache>,
    navigator: Arc<dyn Navigator>,
) -> Result<()> {
    match command {
        Commands::Show { report } => {
            let report = store
                .get_report(report)
                .await?
                .ok_or_else(|| anyhow!("report {report} not found"))?;
            println!("{} (#{})", report.title, report.id);
            for finding in sorted_view(&report) {
                println!(
                    "  [{:>3}] #{} {:?} {}",
                    finding.order_key(),
                    finding.id,
                    finding.risk_level,
                    finding.title
                );
                for image in &finding.poc_images {
                    println!("        image #{} {}", image.id, image.original_filename);
                }
            }
            Ok(())
        }
        Commands::Create {
            report,
            title,
            description,
            risk,
            owasp,
            affected_area,
            impact,
            solution,
            steps,
            cvss_score,
            cwe_id,
            refs,
            images,
            autofill,
            save_to_kb,
            add_another,
        } => {
            let mut workflow = match FindingSubmissionWorkflow::for_report(
                store,
                cache,
                Arc::clone(&navigator),
                report,
            )
            .await
            {
                Ok(workflow) => workflow,
                Err(err @ WorkflowError::ReportNotFound(_)) => {
                    // The only exit from a missing report is back to the list.
                    navigator.to_report_list().await;
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            };

            let mut draft = FindingDraft::for_report(report);
            draft.title = title;
            draft.description = description;
            draft.risk_level = parse_risk(&risk)?;
            draft.affected_area = affected_area;
            draft.impact = impact;
            draft.solution = solution;
            draft.steps_to_reproduce = steps;
            draft.cvss_score = cvss_score;
            draft.cwe_id = cwe_id;
            draft.refs = refs;
            if let Some(owasp) = owasp {
                let category = parse_owasp(&owasp)?;
                draft.owasp_category = Some(category);
                if autofill {
                    apply_owasp_autofill(&mut draft, category);
                }
            }

            for image in load_images(&images).await? {
                workflow.add_pending_image(image);
            }

            let upload = workflow.submit(&draft).await?;
            report_upload(&upload);
            if let Some(finding_id) = workflow.state().finding_id() {
                println!("finding #{finding_id} created on report #{report}");
            }

            if save_to_kb {
                let template = workflow.promote().await?;
                println!("saved to knowledge base as template #{}", template.id);
            } else if add_another {
                workflow.add_another()?;
                println!("draft cleared, ready for another finding on report #{report}");
            } else {
                workflow.skip().await?;
            }
            Ok(())
        }
        Commands::Edit {
            finding,
            title,
            description,
            risk,
            owasp,
            affected_area,
            impact,
            solution,
            steps,
            cvss_score,
            cwe_id,
            refs,
            images,
        } => {
            let (mut workflow, mut draft) = match FindingSubmissionWorkflow::for_finding(
                store,
                cache,
                Arc::clone(&navigator),
                finding,
            )
            .await
            {
                Ok(mounted) => mounted,
                Err(err @ WorkflowError::FindingNotFound(_)) => {
                    navigator.to_report_list().await;
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            };

            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(description) = description {
                draft.description = description;
            }
            if let Some(risk) = risk {
                draft.risk_level = parse_risk(&risk)?;
            }
            if let Some(owasp) = owasp {
                draft.owasp_category = Some(parse_owasp(&owasp)?);
            }
            if let Some(affected_area) = affected_area {
                draft.affected_area = Some(affected_area);
            }
            if let Some(impact) = impact {
                draft.impact = Some(impact);
            }
            if let Some(solution) = solution {
                draft.solution = Some(solution);
            }
            if let Some(steps) = steps {
                draft.steps_to_reproduce = Some(steps);
            }
            if let Some(cvss_score) = cvss_score {
                draft.cvss_score = Some(cvss_score);
            }
            if let Some(cwe_id) = cwe_id {
                draft.cwe_id = Some(cwe_id);
            }
            if let Some(refs) = refs {
                draft.refs = Some(refs);
            }

            for image in load_images(&images).await? {
                workflow.add_pending_image(image);
            }

            let upload = workflow.edit_submit(finding, &draft).await?;
            report_upload(&upload);
            println!("finding #{finding} updated");
            Ok(())
        }
        Commands::Move {
            report,
            finding,
            direction,
        } => {
            let direction = parse_direction(&direction)?;
            let coordinator = FindingOrderCoordinator::new(store, cache, report);
            match coordinator.move_finding(finding, direction).await? {
                MoveOutcome::Committed { ordered_ids } => {
                    println!("new order: {ordered_ids:?}");
                }
                MoveOutcome::AtBoundary => {
                    println!("finding #{finding} is already at the boundary, nothing to do");
                }
                MoveOutcome::Busy => {
                    println!("a reorder is already in flight for report #{report}, try again");
                }
            }
            Ok(())
        }
        Commands::Delete { finding } => {
            store.delete_finding(finding).await?;
            info!(finding_id = finding, "finding deleted");
            println!("finding #{finding} deleted");
            Ok(())
        }
        Commands::DeleteImage { image } => {
            store.delete_image(image).await?;
            println!("image #{image} deleted");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_levels_parse_case_insensitively() {
        assert_eq!(parse_risk("Critical").unwrap(), RiskLevel::Critical);
        assert_eq!(parse_risk("info").unwrap(), RiskLevel::Info);
        assert!(parse_risk("severe").is_err());
    }

    #[test]
    fn owasp_categories_parse_by_wire_name() {
        assert_eq!(parse_owasp("injection").unwrap(), OwaspCategory::Injection);
        assert_eq!(parse_owasp("ssrf").unwrap(), OwaspCategory::Ssrf);
        assert!(parse_owasp("a03").is_err());
    }

    #[test]
    fn directions_parse() {
        assert_eq!(parse_direction("up").unwrap(), MoveDirection::Up);
        assert_eq!(parse_direction("Down").unwrap(), MoveDirection::Down);
        assert!(parse_direction("sideways").is_err());
    }

    #[tokio::test]
    async fn images_load_with_their_filenames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poc.png");
        tokio::fs::write(&path, b"not really a png").await.unwrap();

        let images = load_images(&[path]).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].filename, "poc.png");
        assert_eq!(images[0].bytes, b"not really a png");

        let missing = dir.path().join("absent.png");
        assert!(load_images(&[missing]).await.is_err());
    }
}
