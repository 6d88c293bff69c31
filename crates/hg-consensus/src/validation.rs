//! Header and seal validation rules
//!
//! Pure checks with no log or chain access. The engine gathers the parent
//! header and the log records, then calls in here.

use crate::domain::{
    ConsensusError, ConsensusResult, HashgraphSeal, Header, LogRecord, SubmissionRecord,
};
use shared_types::{keccak256, transactions_root, Hash, U256};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

pub struct HeaderValidator;

impl HeaderValidator {
    /// Milliseconds elapsed between the parent's reference time and `time`,
    /// never below 1.
    ///
    /// The parent's reference time is its seal's consensus timestamp, or its
    /// own timestamp when the parent carries none.
    pub fn calc_difficulty(time: u64, parent: &Header) -> U256 {
        let parent_ms = parent
            .seal
            .as_ref()
            .and_then(|seal| seal.consensus_timestamp)
            .map(|ts| ts.as_millis())
            .unwrap_or_else(|| parent.timestamp.saturating_mul(1000));
        let elapsed = time.saturating_mul(1000).saturating_sub(parent_ms);
        U256::from(elapsed.max(1))
    }

    pub fn check_not_future(header: &Header, now: u64, max_drift: u64) -> ConsensusResult<()> {
        if header.timestamp > now.saturating_add(max_drift) {
            return Err(ConsensusError::FutureTimestamp {
                timestamp: header.timestamp,
                current: now,
            });
        }
        Ok(())
    }

    pub fn check_against_parent(header: &Header, parent: &Header) -> ConsensusResult<()> {
        if header.timestamp < parent.timestamp {
            return Err(ConsensusError::InvalidTimestamp {
                block: header.timestamp,
                parent: parent.timestamp,
            });
        }

        let expected = Self::calc_difficulty(header.timestamp, parent);
        if header.difficulty != expected {
            return Err(ConsensusError::InvalidDifficulty {
                expected: expected.to_string(),
                actual: header.difficulty.to_string(),
            });
        }
        Ok(())
    }

    /// Check that `records`, the log messages referencing the header's seal
    /// hash in consensus order, reproduce the header.
    ///
    /// Only records paid by the seal's operator and sequenced at or before the
    /// seal's last sequence number are considered. Anyone can post to the
    /// topic, so other records are skipped. Duplicates of an index must carry
    /// the same payload.
    pub fn check_seal_records(header: &Header, records: &[LogRecord]) -> Result<(), String> {
        let count = header.tx_count as usize;
        if count == 0 {
            if header.transactions_root != transactions_root(std::iter::empty::<&Hash>()) {
                return Err("empty block carries a non-empty transactions root".into());
            }
            return Ok(());
        }

        let seal = header
            .seal
            .as_ref()
            .ok_or_else(|| "header is not sealed".to_string())?;
        let HashgraphSeal {
            operator,
            last_sequence: Some(last_sequence),
            consensus_timestamp: Some(sealed_at),
        } = seal
        else {
            return Err("seal lacks sequence number or timestamp".into());
        };

        let own: Vec<&LogRecord> = records
            .iter()
            .filter(|r| r.payer == *operator && r.sequence_number <= *last_sequence)
            .collect();
        if own.len() < count {
            return Err(format!(
                "header claims {count} transactions, {operator} logged {}",
                own.len()
            ));
        }

        let block_hash = header.seal_hash();
        let mut payloads: BTreeMap<usize, &[u8]> = BTreeMap::new();
        let mut closing_record = None;

        for record in own {
            let parsed: SubmissionRecord = record
                .memo
                .parse()
                .map_err(|e| format!("record {}: {e}", record.sequence_number))?;

            if parsed.count != count {
                return Err(format!(
                    "record {} claims {} transactions, header has {count}",
                    record.sequence_number, parsed.count
                ));
            }
            if parsed.block_hash != block_hash {
                return Err(format!(
                    "record {} references another block",
                    record.sequence_number
                ));
            }

            match payloads.entry(parsed.index) {
                Entry::Vacant(slot) => {
                    slot.insert(record.payload.as_slice());
                }
                Entry::Occupied(slot) if *slot.get() != record.payload.as_slice() => {
                    return Err(format!(
                        "index {} submitted with differing payloads",
                        parsed.index
                    ));
                }
                Entry::Occupied(_) => {}
            }

            if record.sequence_number == *last_sequence {
                closing_record = Some((parsed.index, record.consensus_timestamp));
            }
        }

        let mut hashes = Vec::with_capacity(payloads.len());
        for index in 0..count {
            let payload = payloads
                .get(&index)
                .ok_or_else(|| format!("index {index} missing from log"))?;
            hashes.push(keccak256(*payload));
        }

        match closing_record {
            Some((index, _)) if index != count - 1 => {
                return Err(format!(
                    "sequence {last_sequence} holds index {index}, expected {}",
                    count - 1
                ));
            }
            Some((_, timestamp)) if timestamp != *sealed_at => {
                return Err(format!(
                    "sequence {last_sequence} reached consensus at {timestamp}, seal says {sealed_at}"
                ));
            }
            Some(_) => {}
            None => return Err(format!("no record at sequence {last_sequence}")),
        }

        if transactions_root(&hashes) != header.transactions_root {
            return Err("transactions root does not match logged payloads".into());
        }
        Ok(())
    }
}
