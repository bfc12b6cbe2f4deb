use crate::infra::InMemoryCompetencyRepository;
use chrono::Local;
use clap::Args;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use turbine_crew::error::AppError;
use turbine_crew::workflows::competency::{
    compute_score, export_history_csv, AssessmentRecord, CommitOutcome, CompetencyService,
    FieldEdit, HistoryEntry, LegacyAssessmentImporter, RuleCategory, RuleTable, ScoreResult,
    TechnicianId,
};

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Certification tier key (e.g. senior_technician)
    #[arg(long)]
    pub(crate) tier: Option<String>,
    /// Internal experience band key
    #[arg(long)]
    pub(crate) internal: Option<String>,
    /// External experience band key
    #[arg(long)]
    pub(crate) external: Option<String>,
    /// Education option key, repeat for several
    #[arg(long)]
    pub(crate) education: Vec<String>,
    /// Extra course key, repeat for several
    #[arg(long = "course")]
    pub(crate) courses: Vec<String>,
    /// Assessor's subjective points
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub(crate) subjective: i32,
    /// Rule table JSON to score against instead of the built-in table
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Legacy roster CSV export
    pub(crate) csv: PathBuf,
    /// Rule table JSON to check parity against instead of the built-in table
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    /// Print every imported record with its computed score
    #[arg(long)]
    pub(crate) list_records: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Technician the demo session edits
    #[arg(long, default_value = "WTG-TECH-17")]
    pub(crate) technician: String,
    /// Name recorded as the author of each commit
    #[arg(long, default_value = "crew-lead")]
    pub(crate) actor: String,
    /// Print the ledger as CSV after the session
    #[arg(long)]
    pub(crate) csv: bool,
}

fn load_rules(path: Option<PathBuf>) -> Result<RuleTable, AppError> {
    match path {
        Some(path) => Ok(RuleTable::from_path(path)?),
        None => Ok(RuleTable::standard()),
    }
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        tier,
        internal,
        external,
        education,
        courses,
        subjective,
        rules,
    } = args;

    let rules = load_rules(rules)?;
    let record = AssessmentRecord {
        technician_id: TechnicianId::from("cli"),
        certification_tier: tier,
        internal_experience: internal,
        external_experience: external,
        education: education.into_iter().collect::<BTreeSet<_>>(),
        extra_courses: courses.into_iter().collect::<BTreeSet<_>>(),
        subjective_score: subjective,
    };

    let score = compute_score(&record, &rules);
    println!("Competency score (rules {})", rules.version);
    render_selections(&record, &rules);
    render_score(&score);
    Ok(())
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let ImportArgs {
        csv,
        rules,
        list_records,
    } = args;

    let rules = load_rules(rules)?;
    let imported = LegacyAssessmentImporter::from_path(&csv, &rules)?;

    println!(
        "Imported {} assessments from {} (rules {})",
        imported.records.len(),
        csv.display(),
        rules.version
    );
    println!(
        "- {} match their recorded totals | {} mismatches",
        imported.matched(),
        imported.mismatches.len()
    );

    for mismatch in &imported.mismatches {
        println!(
            "  - line {} {}: recorded {} / level {} -> computed {} / level {}",
            mismatch.line,
            mismatch.technician_id,
            mismatch
                .recorded_total
                .map(|total| total.to_string())
                .unwrap_or_else(|| "-".to_string()),
            mismatch
                .recorded_level
                .map(|level| level.to_string())
                .unwrap_or_else(|| "-".to_string()),
            mismatch.computed_total,
            mismatch.computed_level
        );
    }

    if list_records {
        println!("\nRecords:");
        for record in &imported.records {
            let score = compute_score(record, &rules);
            println!(
                "  - {}: {} points | level {} ({})",
                record.technician_id, score.total_points, score.level, score.level_label
            );
        }
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        technician,
        actor,
        csv,
    } = args;

    let repository = Arc::new(InMemoryCompetencyRepository::default());
    let service = CompetencyService::new(repository, RuleTable::standard());
    let technician_id = TechnicianId(technician);

    println!(
        "Competency assessment demo for {} (rules {})",
        technician_id,
        service.rules().version
    );

    let mut session = service.open_session(&technician_id)?;
    let onboarding = [
        FieldEdit::CertificationTier(Some("technician".to_string())),
        FieldEdit::InternalExperience(Some("internal_gt_5y".to_string())),
        FieldEdit::ExternalExperience(Some("external_gt_5y".to_string())),
        FieldEdit::AddEducation("electrical".to_string()),
        FieldEdit::SubjectiveScore(1),
    ];
    println!("\nOnboarding assessment (live score while editing)");
    for edit in onboarding {
        let description = describe_edit(&edit);
        let score = session.edit(edit);
        println!(
            "  - {:<40} {:>4} points | level {}",
            description, score.total_points, score.level
        );
    }
    let outcome = service.commit_session(&mut session, &actor)?;
    render_outcome(&outcome);

    println!("\nPromotion review");
    let promotion = [
        FieldEdit::CertificationTier(Some("senior_technician".to_string())),
        FieldEdit::AddExtraCourse("hv_switching".to_string()),
    ];
    for edit in promotion {
        let description = describe_edit(&edit);
        let score = session.edit(edit);
        println!(
            "  - {:<40} {:>4} points | level {}",
            description, score.total_points, score.level
        );
    }
    let outcome = service.commit_session(&mut session, &actor)?;
    render_outcome(&outcome);

    println!("\nDiscarded edit");
    session.edit(FieldEdit::SubjectiveScore(5));
    println!("  - draft scores {} points", session.score().total_points);
    session.cancel();
    println!(
        "  - cancelled, back to {} points ({:?})",
        session.score().total_points,
        session.state()
    );

    let outcome = service.commit_session(&mut session, &actor)?;
    println!("  - commit without edits: {}", outcome.label());

    let history = service.history(&technician_id)?;
    println!("\nAudit ledger ({} entries, most recent first)", history.len());
    for entry in &history {
        render_entry(entry);
    }

    if csv {
        println!();
        export_history_csv(&history, std::io::stdout()).map_err(std::io::Error::from)?;
    }

    Ok(())
}

fn describe_edit(edit: &FieldEdit) -> String {
    match edit {
        FieldEdit::CertificationTier(value) => {
            format!("tier = {}", value.as_deref().unwrap_or("none"))
        }
        FieldEdit::InternalExperience(value) => {
            format!("internal = {}", value.as_deref().unwrap_or("none"))
        }
        FieldEdit::ExternalExperience(value) => {
            format!("external = {}", value.as_deref().unwrap_or("none"))
        }
        FieldEdit::Education(set) => format!("education = {} options", set.len()),
        FieldEdit::AddEducation(key) => format!("+ education {key}"),
        FieldEdit::RemoveEducation(key) => format!("- education {key}"),
        FieldEdit::ExtraCourses(set) => format!("courses = {} options", set.len()),
        FieldEdit::AddExtraCourse(key) => format!("+ course {key}"),
        FieldEdit::RemoveExtraCourse(key) => format!("- course {key}"),
        FieldEdit::SubjectiveScore(points) => format!("subjective = {points}"),
    }
}

fn render_selections(record: &AssessmentRecord, rules: &RuleTable) {
    let tier = record
        .certification_tier
        .as_deref()
        .map(|key| rules.tier_label(key))
        .unwrap_or("None");
    println!("- Certification tier: {tier}");

    let single = |category: RuleCategory, value: &Option<String>| {
        value
            .as_deref()
            .map(|key| rules.label(category, key).to_string())
            .unwrap_or_else(|| "None".to_string())
    };
    println!(
        "- {}: {}",
        RuleCategory::InternalExperience.label(),
        single(RuleCategory::InternalExperience, &record.internal_experience)
    );
    println!(
        "- {}: {}",
        RuleCategory::ExternalExperience.label(),
        single(RuleCategory::ExternalExperience, &record.external_experience)
    );

    for (category, keys) in [
        (RuleCategory::Education, &record.education),
        (RuleCategory::ExtraCourses, &record.extra_courses),
    ] {
        let labels: Vec<_> = keys.iter().map(|key| rules.label(category, key)).collect();
        let joined = if labels.is_empty() {
            "None".to_string()
        } else {
            labels.join(", ")
        };
        println!("- {}: {}", category.label(), joined);
    }
}

fn render_score(score: &ScoreResult) {
    let subtotals = &score.subtotals;
    println!(
        "Experience: ({} internal + {} external) x {:.1} = {}",
        subtotals.internal_experience,
        subtotals.external_experience,
        subtotals.multiplier,
        subtotals.experience
    );
    println!(
        "Education {} | extra courses {} | subjective {}",
        subtotals.education, subtotals.extra_courses, subtotals.subjective
    );
    println!(
        "Total {} points -> level {} ({})",
        score.total_points, score.level, score.level_label
    );
    match score.next_level_at {
        Some(threshold) => println!(
            "Next level at {} points ({} to go)",
            threshold,
            threshold.saturating_sub(score.total_points)
        ),
        None => println!("Highest level reached"),
    }
}

fn render_outcome(outcome: &CommitOutcome) {
    match outcome {
        CommitOutcome::Initial(snapshot) => println!(
            "  Committed initial assessment: {} points, level {} (no history entry)",
            snapshot.score.total_points, snapshot.score.level
        ),
        CommitOutcome::Unchanged => println!("  Nothing changed, nothing recorded"),
        CommitOutcome::Recorded(entry) => println!(
            "  Recorded {} with {} changes",
            entry.id.0,
            entry.changes.len()
        ),
    }
}

fn render_entry(entry: &HistoryEntry) {
    println!(
        "- {} by {} at {} | {} -> {} points | level {} -> {}",
        entry.id.0,
        entry.actor,
        entry
            .recorded_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S"),
        entry.previous.score.total_points,
        entry.current.score.total_points,
        entry.previous.score.level,
        entry.current.score.level
    );
    for change in &entry.changes {
        println!("    {change}");
    }
}
