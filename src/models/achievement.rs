use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub code: String,
    pub name: String,
    pub description: String,
    pub icon: String,
}
