//! Match scripts: a recorded match written with player and team names.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

use scorebook_sdk::{
    AwardedTo, DeliveryInput, DismissalInput, DismissalKind, NextInnings, PlayerId, SyncEvent,
    TeamId,
};

#[derive(Clone, Debug, Deserialize)]
pub struct MatchScript {
    pub format: String,
    pub team1: TeamSheet,
    pub team2: TeamSheet,
    pub events: Vec<ScriptEvent>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TeamSheet {
    pub name: String,
    pub players: Vec<String>,
}

impl TeamSheet {
    pub fn id(&self) -> TeamId {
        TeamId::named(&self.name)
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| PlayerId::named(p)).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extra {
    Wide,
    NoBall,
    Bye,
    LegBye,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Out {
    pub kind: DismissalKind,
    pub player: String,
    #[serde(default)]
    pub fielder: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptEvent {
    StartSession {
        #[serde(default)]
        batting_first: Option<String>,
    },
    Select {
        #[serde(default)]
        striker: Option<String>,
        #[serde(default)]
        non_striker: Option<String>,
        #[serde(default)]
        bowler: Option<String>,
    },
    Ball {
        striker: String,
        non_striker: String,
        bowler: String,
        #[serde(default)]
        runs: u32,
        #[serde(default)]
        extras: Vec<Extra>,
        #[serde(default)]
        out: Option<Out>,
        #[serde(default)]
        expect: Option<u32>,
    },
    Undo,
    Dls {
        #[serde(default)]
        target: Option<u32>,
        #[serde(default)]
        overs: Option<u32>,
    },
    Penalty {
        runs: u32,
        to: AwardedTo,
        #[serde(default)]
        reason: String,
    },
    EndInnings,
    Declare,
    NextInnings {
        #[serde(default)]
        super_over: bool,
        #[serde(default)]
        follow_on: bool,
    },
    EndMatch,
}

impl MatchScript {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        Self::parse(&source).with_context(|| format!("parsing script {}", path.display()))
    }

    pub fn parse(source: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Player names by id, for printing scorecards.
    pub fn names(&self) -> HashMap<PlayerId, String> {
        [&self.team1, &self.team2]
            .into_iter()
            .flat_map(|team| team.players.iter())
            .map(|name| (PlayerId::named(name), name.clone()))
            .collect()
    }

    /// Resolve names into sync events. `MarkReady` always comes first.
    pub fn to_events(&self) -> anyhow::Result<Vec<SyncEvent>> {
        let names = self.names();
        let player = |name: &str| -> anyhow::Result<PlayerId> {
            let id = PlayerId::named(name);
            if !names.contains_key(&id) {
                bail!("unknown player {name:?}");
            }
            Ok(id)
        };
        let team = |name: &str| -> anyhow::Result<TeamId> {
            let id = TeamId::named(name);
            if id != self.team1.id() && id != self.team2.id() {
                bail!("unknown team {name:?}");
            }
            Ok(id)
        };
        let optional = |name: &Option<String>| name.as_deref().map(player).transpose();

        let mut events = vec![SyncEvent::MarkReady];
        for event in &self.events {
            let converted = match event {
                ScriptEvent::StartSession { batting_first } => SyncEvent::StartSession {
                    batting_first: batting_first.as_deref().map(team).transpose()?,
                },
                ScriptEvent::Select {
                    striker,
                    non_striker,
                    bowler,
                } => SyncEvent::SelectParticipants {
                    striker: optional(striker)?,
                    non_striker: optional(non_striker)?,
                    bowler: optional(bowler)?,
                },
                ScriptEvent::Ball {
                    striker,
                    non_striker,
                    bowler,
                    runs,
                    extras,
                    out,
                    expect,
                } => {
                    let mut input = DeliveryInput::new(
                        player(striker.as_str())?,
                        player(non_striker.as_str())?,
                        player(bowler.as_str())?,
                    )
                    .runs(*runs);
                    for extra in extras {
                        input = match extra {
                            Extra::Wide => input.wide(),
                            Extra::NoBall => input.no_ball(),
                            Extra::Bye => input.bye(),
                            Extra::LegBye => input.leg_bye(),
                        };
                    }
                    if let Some(out) = out {
                        let mut dismissal = DismissalInput::new(out.kind, player(out.player.as_str())?);
                        if let Some(fielder) = &out.fielder {
                            dismissal = dismissal.with_fielder(player(fielder.as_str())?);
                        }
                        input = input.dismissal(dismissal);
                    }
                    if let Some(ball) = expect {
                        input = input.expecting(*ball);
                    }
                    SyncEvent::Delivery(input)
                }
                ScriptEvent::Undo => SyncEvent::Undo,
                ScriptEvent::Dls { target, overs } => SyncEvent::Dls {
                    revised_target_runs: *target,
                    revised_max_overs: *overs,
                },
                ScriptEvent::Penalty { runs, to, reason } => SyncEvent::Penalty {
                    runs: *runs,
                    awarded_to: *to,
                    reason: reason.clone(),
                },
                ScriptEvent::EndInnings => SyncEvent::EndInnings,
                ScriptEvent::Declare => SyncEvent::Declare,
                ScriptEvent::NextInnings {
                    super_over,
                    follow_on,
                } => SyncEvent::StartNextInnings(NextInnings {
                    super_over: *super_over,
                    enforce_follow_on: *follow_on,
                }),
                ScriptEvent::EndMatch => SyncEvent::EndMatch,
            };
            events.push(converted);
        }
        Ok(events)
    }
}
