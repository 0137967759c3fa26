//! Tool call id allocation

use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use std::collections::HashSet;

const GENERATED_ID_LEN: usize = 24;

/// Generate a fresh `call_` id
pub fn generate_call_id() -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_ID_LEN)
        .map(char::from)
        .collect();
    format!("call_{}", suffix)
}

/// Hands out ids for one turn
///
/// Server ids are passed through; missing ids are generated when the call is
/// emitted, never while its fragments are still buffering.
#[derive(Debug, Default)]
pub struct CallIdAllocator {
    issued: HashSet<String>,
}

impl CallIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, upstream: Option<&str>) -> String {
        if let Some(id) = upstream.map(str::trim).filter(|id| !id.is_empty()) {
            self.issued.insert(id.to_string());
            return id.to_string();
        }

        loop {
            let id = generate_call_id();
            if self.issued.insert(id.clone()) {
                return id;
            }
        }
    }

    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}
