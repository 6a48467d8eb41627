use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde::Serialize;

use scorebook_sdk::{
    overs_notation, InMemoryLedger, InningsReadModel, InningsState, MatchId, MatchReadModel, PlayerId,
    ScopeContext, Scorer, ScorerConfig, StaticRoster, SyncBatch, SyncReport, TeamId,
};

use crate::cli::*;
use crate::script::MatchScript;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ScorerConfig::load(path)?,
        None => ScorerConfig::default(),
    };
    match cli.command {
        Command::Formats(_) => cmd_formats(config, &cli.format),
        Command::Replay(args) => cmd_replay(config, args, &cli.format),
        Command::Verify(args) => cmd_verify(config, args, &cli.format),
    }
}

/// A script replayed into a fresh in-memory scorer.
struct Replayed {
    scorer: Scorer,
    match_id: MatchId,
    report: SyncReport,
    players: HashMap<PlayerId, String>,
    teams: HashMap<TeamId, String>,
}

impl Replayed {
    fn player(&self, id: PlayerId) -> String {
        self.players
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.short_id())
    }

    fn team(&self, id: TeamId) -> String {
        self.teams.get(&id).cloned().unwrap_or_else(|| id.short_id())
    }

    /// Read-models of every innings that has started, in order.
    fn innings(&self) -> anyhow::Result<Vec<InningsReadModel>> {
        self.scorer
            .innings(self.match_id)?
            .iter()
            .filter(|record| record.was_played())
            .map(|record| -> anyhow::Result<InningsReadModel> {
                Ok(self.scorer.innings_read_model(record.innings_id)?)
            })
            .collect()
    }
}

fn replay(config: ScorerConfig, script: &MatchScript) -> anyhow::Result<Replayed> {
    let roster = Arc::new(StaticRoster::new());
    let scorer = Scorer::with_parts(config, InMemoryLedger::new(), roster.clone())?;
    let scope = ScopeContext::local();

    let (team1, team2) = (script.team1.id(), script.team2.id());
    let m = scorer.create_match(&scope, team1, team2, &script.format)?;
    roster.set_playing_xi(m.match_id, team1, script.team1.player_ids());
    roster.set_playing_xi(m.match_id, team2, script.team2.player_ids());

    let batch = SyncBatch {
        match_id: m.match_id,
        events: script.to_events()?,
    };
    let report = scorer
        .apply_batch(&scope, &batch)
        .context("replaying script")?;

    Ok(Replayed {
        scorer,
        match_id: m.match_id,
        report,
        players: script.names(),
        teams: HashMap::from([
            (team1, script.team1.name.clone()),
            (team2, script.team2.name.clone()),
        ]),
    })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_formats(config: ScorerConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let scorer = Scorer::new(config)?;
    let formats = scorer.formats()?;
    if let OutputFormat::Json = format {
        return print_json(&formats);
    }

    for rules in &formats {
        let overs = rules
            .max_overs
            .map_or_else(|| "unlimited".to_string(), |o| format!("{o} overs"));
        let mut extras = Vec::new();
        if rules.super_over_allowed {
            extras.push("super over");
        }
        if rules.follow_on_allowed {
            extras.push("follow-on");
        }
        println!(
            "{:<8} {:<24} {} balls/over, {}, {} innings  {}",
            rules.code.bold(),
            rules.name,
            rules.balls_per_over,
            overs,
            rules.max_innings,
            extras.join(", ").dimmed()
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct ReplayOutput<'a> {
    #[serde(rename = "match")]
    summary: &'a MatchReadModel,
    innings: Vec<InningsReadModel>,
    sync: &'a SyncReport,
}

fn cmd_replay(config: ScorerConfig, args: ReplayArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let script = MatchScript::load(&args.script)?;
    let replayed = replay(config, &script)?;
    let summary = replayed.scorer.read_model(replayed.match_id)?;
    let innings: Vec<InningsReadModel> = replayed
        .innings()?
        .into_iter()
        .filter(|i| args.innings.map_or(true, |n| i.innings_number == n))
        .collect();

    if let OutputFormat::Json = format {
        return print_json(&ReplayOutput {
            summary: &summary,
            innings,
            sync: &replayed.report,
        });
    }

    println!(
        "{} v {} ({})  {}",
        replayed.team(summary.team1).bold(),
        replayed.team(summary.team2).bold(),
        summary.rules.code,
        summary.state.to_string().cyan()
    );
    for model in &innings {
        print_scorecard(&replayed, model, summary.rules.balls_per_over);
    }
    println!(
        "\n{} {} events applied",
        "✓".green().bold(),
        replayed.report.applied
    );
    Ok(())
}

fn print_scorecard(replayed: &Replayed, model: &InningsReadModel, balls_per_over: u32) {
    let label = if model.is_super_over {
        format!("Super over {}", model.super_over_index)
    } else if model.is_follow_on {
        format!("Innings {} (follow-on)", model.innings_number)
    } else {
        format!("Innings {}", model.innings_number)
    };
    let mut status = String::new();
    if model.declared {
        status.push_str(" d");
    }
    if model.state == InningsState::Abandoned {
        status.push_str(" abandoned");
    }
    println!(
        "\n{}: {} {}{}",
        label.yellow().bold(),
        replayed.team(model.batting_team),
        model.score_line().bold(),
        status
    );
    if let Some(target) = model.effective_target {
        println!("  Target {target}");
    }

    println!("  {:<20} {:>4} {:>4} {:>3} {:>3}", "Batter".dimmed(), "R", "B", "4s", "6s");
    for batter in &model.batting {
        let how = match (batter.is_out, batter.dismissal) {
            (true, Some(kind)) => kind.to_string().to_lowercase(),
            (true, None) => "out".to_string(),
            (false, _) => "not out".to_string(),
        };
        println!(
            "  {:<20} {:>4} {:>4} {:>3} {:>3}  {}",
            replayed.player(batter.player),
            batter.runs,
            batter.balls,
            batter.fours,
            batter.sixes,
            how.dimmed()
        );
    }
    println!("  Extras {}", model.aggregate.extras);

    println!("  {:<20} {:>5} {:>4} {:>3}", "Bowler".dimmed(), "O", "R", "W");
    for bowler in &model.bowling {
        let overs = overs_notation(bowler.legal_balls, balls_per_over);
        println!(
            "  {:<20} {:>5} {:>4} {:>3}",
            replayed.player(bowler.player),
            overs,
            bowler.runs_conceded,
            bowler.wickets
        );
    }
}

#[derive(Serialize)]
struct InningsCheck {
    innings_number: u32,
    ball_count: u32,
    digest: Option<String>,
    ledger_valid: bool,
    projection_consistent: bool,
    deterministic: bool,
    violations: Vec<String>,
}

impl InningsCheck {
    fn passed(&self) -> bool {
        self.ledger_valid && self.projection_consistent && self.deterministic
    }
}

fn cmd_verify(config: ScorerConfig, args: VerifyArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let script = MatchScript::load(&args.script)?;
    let first = replay(config.clone(), &script)?;
    let second = replay(config, &script)?;
    let (innings, again) = (first.innings()?, second.innings()?);
    if innings.len() != again.len() {
        bail!("replays produced {} and {} innings", innings.len(), again.len());
    }

    let mut checks = Vec::new();
    for (model, other) in innings.iter().zip(&again) {
        let report = first.scorer.validate_ledger(model.innings_id)?;
        checks.push(InningsCheck {
            innings_number: model.innings_number,
            ball_count: report.ball_count,
            digest: model.digest.clone(),
            ledger_valid: report.is_valid(),
            projection_consistent: first.scorer.verify_innings(model.innings_id)?,
            deterministic: model.score_line() == other.score_line()
                && model.batting == other.batting
                && model.bowling == other.bowling,
            violations: report
                .violations
                .iter()
                .map(|v| format!("ball {}: {}", v.ball_number, v.description))
                .collect(),
        });
    }

    let failed = checks.iter().filter(|c| !c.passed()).count();
    if let OutputFormat::Json = format {
        print_json(&checks)?;
    } else {
        for check in &checks {
            let mark = if check.passed() {
                "✓".green().bold()
            } else {
                "✗".red().bold()
            };
            println!(
                "{} Innings {}: {} balls, head {}",
                mark,
                check.innings_number,
                check.ball_count,
                check.digest.as_deref().map_or("-", |d| &d[..16]).dimmed()
            );
            println!("  Hash chain: {}", verdict(check.ledger_valid, "valid", "broken"));
            println!(
                "  Projection: {}",
                verdict(check.projection_consistent, "matches rebuild", "drifted")
            );
            println!(
                "  Replay: {}",
                verdict(check.deterministic, "deterministic", "diverged")
            );
            for violation in &check.violations {
                println!("    {}", violation.red());
            }
        }
    }

    if failed > 0 {
        bail!("{failed} innings failed verification");
    }
    Ok(())
}

fn verdict(ok: bool, good: &str, bad: &str) -> colored::ColoredString {
    if ok {
        good.green()
    } else {
        bad.red()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl std::fmt::Debug for Replayed {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Replayed").finish_non_exhaustive()
        }
    }

    const SCRIPT: &str = r#"{
        "format": "T10",
        "team1": {"name": "Lions", "players": ["Ali", "Ben", "Cal", "Dan"]},
        "team2": {"name": "Tigers", "players": ["Eve", "Fay", "Gus", "Hal"]},
        "events": [
            {"op": "start_session"},
            {"op": "select", "striker": "Ali", "non_striker": "Ben", "bowler": "Hal"},
            {"op": "ball", "striker": "Ali", "non_striker": "Ben", "bowler": "Hal", "runs": 4},
            {"op": "ball", "striker": "Ali", "non_striker": "Ben", "bowler": "Hal",
             "out": {"kind": "BOWLED", "player": "Ali"}},
            {"op": "select", "striker": "Cal"},
            {"op": "ball", "striker": "Cal", "non_striker": "Ben", "bowler": "Hal", "runs": 1},
            {"op": "end_innings"},
            {"op": "next_innings"},
            {"op": "select", "striker": "Eve", "non_striker": "Fay", "bowler": "Dan"},
            {"op": "ball", "striker": "Eve", "non_striker": "Fay", "bowler": "Dan", "runs": 6}
        ]
    }"#;

    #[test]
    fn replays_script_into_scorer() {
        let script = MatchScript::parse(SCRIPT).unwrap();
        let replayed = replay(ScorerConfig::default(), &script).unwrap();
        assert_eq!(replayed.report.applied, 11);

        let innings = replayed.innings().unwrap();
        assert_eq!(innings.len(), 2);
        assert_eq!(innings[0].score_line(), "5/1 (0.3 ov)");
        assert_eq!(innings[1].effective_target, Some(6));
        assert_eq!(replayed.player(innings[1].batting[0].player), "Eve");
        assert_eq!(replayed.team(innings[1].batting_team), "Tigers");

        let summary = replayed.scorer.read_model(replayed.match_id).unwrap();
        assert_eq!(summary.state, scorebook_sdk::MatchState::InProgress);
    }

    #[test]
    fn failing_event_is_reported() {
        let mut script = MatchScript::parse(SCRIPT).unwrap();
        script.format = "T15".into();
        assert!(replay(ScorerConfig::default(), &script).is_err());

        let broken = SCRIPT.replace(r#""runs": 1}"#, r#""runs": 1, "expect": 9}"#);
        let script = MatchScript::parse(&broken).unwrap();
        let err = replay(ScorerConfig::default(), &script).unwrap_err();
        assert!(format!("{err:#}").contains("event 6"));
    }
}
