use std::collections::HashSet;

use scorebook_types::InningsId;

use crate::error::LedgerError;
use crate::records::BallRecord;
use crate::traits::LedgerReader;

/// Result of innings stream validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub innings_id: InningsId,
    pub ball_count: u32,
    pub sequence_contiguous: bool,
    pub hash_chain_valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub ball_number: u32,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    SequenceGap,
    DuplicateBallNumber,
    ForeignInnings,
    HashChainBreak,
    HashMismatch,
}

/// Innings stream integrity validator. Collects every violation instead
/// of stopping at the first.
pub struct StreamValidator;

impl StreamValidator {
    pub fn validate_innings<R: LedgerReader + ?Sized>(
        reader: &R,
        innings: InningsId,
    ) -> Result<ValidationReport, LedgerError> {
        let balls = reader.balls(innings)?;
        Ok(Self::validate_records(innings, &balls))
    }

    /// Validate an ordered list of ball records, e.g. one received from
    /// another device.
    pub fn validate_records(innings: InningsId, balls: &[BallRecord]) -> ValidationReport {
        let mut violations = Vec::new();
        let mut sequence_contiguous = true;
        let mut hash_chain_valid = true;
        let mut seen_numbers = HashSet::new();

        for (index, record) in balls.iter().enumerate() {
            let number = record.ball_number();

            if record.innings_id() != innings {
                violations.push(Violation {
                    ball_number: number,
                    kind: ViolationKind::ForeignInnings,
                    description: format!("record belongs to innings {}", record.innings_id()),
                });
            }

            if !seen_numbers.insert(number) {
                sequence_contiguous = false;
                violations.push(Violation {
                    ball_number: number,
                    kind: ViolationKind::DuplicateBallNumber,
                    description: format!("ball {number} appears more than once"),
                });
            } else {
                let expected = index as u32 + 1;
                if number != expected {
                    sequence_contiguous = false;
                    violations.push(Violation {
                        ball_number: number,
                        kind: ViolationKind::SequenceGap,
                        description: format!("expected ball {expected}, got {number}"),
                    });
                }
            }

            let expected_prev = index.checked_sub(1).map(|i| balls[i].record_hash);
            if record.prev_hash != expected_prev {
                hash_chain_valid = false;
                violations.push(Violation {
                    ball_number: number,
                    kind: ViolationKind::HashChainBreak,
                    description: "previous hash link mismatch".into(),
                });
            }

            if let Ok(computed) = record.compute_hash() {
                if computed != record.record_hash {
                    hash_chain_valid = false;
                    violations.push(Violation {
                        ball_number: number,
                        kind: ViolationKind::HashMismatch,
                        description: "record hash does not match computed".into(),
                    });
                }
            }
        }

        ValidationReport {
            innings_id: innings,
            ball_count: balls.len() as u32,
            sequence_contiguous,
            hash_chain_valid,
            violations,
        }
    }
}
