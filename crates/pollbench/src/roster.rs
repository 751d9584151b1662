//! Synthetic voter identities drawn from first/last name lists.

use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BenchError, BenchResult};

pub const VOTER_ID_LEN: usize = 10;

const VOTER_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterProfile {
    pub name: String,
    pub gender: Gender,
}

/// First and last names to combine into voter names.
#[derive(Debug, Clone)]
pub struct NamePool {
    first: Vec<String>,
    last: Vec<String>,
}

impl NamePool {
    /// Load both lists from JSON files holding arrays of strings.
    pub fn load(first_path: &Path, last_path: &Path) -> BenchResult<Self> {
        let first = read_name_list(first_path)?;
        let last = read_name_list(last_path)?;
        Ok(Self { first, last })
    }

    pub fn from_lists(first: Vec<String>, last: Vec<String>) -> BenchResult<Self> {
        if first.is_empty() || last.is_empty() {
            return Err(BenchError::InvalidConfig(
                "name lists must not be empty".into(),
            ));
        }
        Ok(Self { first, last })
    }

    pub fn sizes(&self) -> (usize, usize) {
        (self.first.len(), self.last.len())
    }

    /// Pick a random "First Last" name and a gender with equal odds.
    pub fn random_voter<R: Rng + ?Sized>(&self, rng: &mut R) -> VoterProfile {
        // Both lists are non-empty by construction.
        let first = self.first.choose(rng).map(String::as_str).unwrap_or_default();
        let last = self.last.choose(rng).map(String::as_str).unwrap_or_default();
        let gender = if rng.gen_bool(0.5) {
            Gender::Female
        } else {
            Gender::Male
        };
        VoterProfile {
            name: format!("{first} {last}"),
            gender,
        }
    }
}

fn read_name_list(path: &Path) -> BenchResult<Vec<String>> {
    let err = |reason: String| BenchError::NameList {
        path: path.to_path_buf(),
        reason,
    };
    let data = std::fs::read_to_string(path).map_err(|e| err(e.to_string()))?;
    let names: Vec<String> = serde_json::from_str(&data).map_err(|e| err(e.to_string()))?;
    if names.is_empty() {
        return Err(err("list is empty".to_string()));
    }
    Ok(names)
}

/// Random lowercase alphanumeric id.
pub fn random_voter_id<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| VOTER_ID_ALPHABET[rng.gen_range(0..VOTER_ID_ALPHABET.len())] as char)
        .collect()
}

/// Keep only the `results` array of a name-generator dump, dropping each
/// record's `profile` key.
pub fn clean_results(doc: Value) -> Vec<Value> {
    let results = match doc {
        Value::Object(mut map) => map.remove("results"),
        _ => None,
    };
    let Some(Value::Array(records)) = results else {
        return Vec::new();
    };
    records
        .into_iter()
        .map(|record| match record {
            Value::Object(mut map) => {
                map.remove("profile");
                Value::Object(map)
            }
            other => other,
        })
        .collect()
}

/// Read `input`, clean it, write pretty JSON to `output`. Returns the record count.
pub fn clean_file(input: &Path, output: &Path) -> BenchResult<usize> {
    let raw = std::fs::read_to_string(input)?;
    let doc: Value = serde_json::from_str(&raw)?;
    let cleaned = clean_results(doc);
    std::fs::write(output, serde_json::to_string_pretty(&cleaned)?)?;
    Ok(cleaned.len())
}
