use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CallerId, ResourceId, TenantId};

/// One record of a mutating or sensitive read operation, persisted the way
/// the teacher's blob store writes its `_audit/` manifests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub tenant_id: TenantId,
    pub caller_id: CallerId,
    pub action: AuditAction,
    pub target_id: Option<ResourceId>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Ingest,
    Update,
    Delete,
    Search,
    CategoryChange,
}
