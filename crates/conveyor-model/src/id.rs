use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
  ($name:ident) => {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct $name(u64);

    impl $name {
      pub const fn new(id: u64) -> Self {
        Self(id)
      }

      pub const fn value(self) -> u64 {
        self.0
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
      }
    }

    impl From<u64> for $name {
      fn from(id: u64) -> Self {
        Self(id)
      }
    }
  };
}

id_type!(JobId);
id_type!(EventId);
id_type!(BuildId);
