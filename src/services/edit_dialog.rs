//! Edit Dialog
//!
//! `Closed -> Open { original, draft } -> Closed`. Row selection is split in
//! two: `begin_select` hands out a ticket before the detail fetch starts and
//! `complete_select` only accepts the result for the latest ticket, so a slow
//! fetch for an earlier row can never open the dialog over a newer one.

use tracing::{debug, warn};

use crate::error::DashboardError;
use crate::models::asset::AssetRecord;
use crate::models::dashboard::{DialogResponse, EditableField};

#[derive(Debug, Clone, PartialEq)]
pub enum DialogState {
    Closed,
    Open {
        original: AssetRecord,
        draft: AssetRecord,
    },
}

/// Tag for one in-flight detail fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTicket {
    seq: u64,
    id: String,
}

impl SelectionTicket {
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug)]
pub struct EditDialog {
    state: DialogState,
    pending: Option<SelectionTicket>,
    next_seq: u64,
}

impl EditDialog {
    pub fn new() -> Self {
        Self {
            state: DialogState::Closed,
            pending: None,
            next_seq: 0,
        }
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DialogState::Open { .. })
    }

    pub fn pending_id(&self) -> Option<&str> {
        self.pending.as_ref().map(|t| t.id.as_str())
    }

    /// Row activation. Supersedes any selection still waiting for its fetch.
    pub fn begin_select(&mut self, id: &str) -> SelectionTicket {
        self.next_seq += 1;
        let ticket = SelectionTicket {
            seq: self.next_seq,
            id: id.to_string(),
        };
        if let Some(previous) = self.pending.replace(ticket.clone()) {
            debug!("Selection of '{}' superseded by '{}'", previous.id, id);
        }
        ticket
    }

    /// Deliver the detail fetch result for `ticket`. On success the dialog
    /// opens with a draft copy of the record; on failure it stays as it was.
    pub fn complete_select(
        &mut self,
        ticket: &SelectionTicket,
        result: Result<AssetRecord, DashboardError>,
    ) -> Result<AssetRecord, DashboardError> {
        if self.pending.as_ref() != Some(ticket) {
            debug!("Discarding stale detail result for '{}'", ticket.id);
            return Err(DashboardError::SelectionSuperseded {
                id: ticket.id.clone(),
            });
        }
        self.pending = None;

        match result {
            Ok(record) => {
                if record.id != ticket.id {
                    warn!("Detail for '{}' came back as '{}'", ticket.id, record.id);
                }
                self.state = DialogState::Open {
                    original: record.clone(),
                    draft: record.clone(),
                };
                Ok(record)
            }
            Err(e) => {
                warn!("Error fetching coin details: {}", e);
                Err(e)
            }
        }
    }

    /// Change one field of the draft. The store is not touched.
    pub fn edit(&mut self, field: EditableField, value: String) -> Result<&AssetRecord, DashboardError> {
        match &mut self.state {
            DialogState::Open { draft, .. } => {
                match field {
                    EditableField::Name => draft.name = Some(value),
                    EditableField::PriceUsd => draft.price_usd = Some(value),
                }
                Ok(&*draft)
            }
            DialogState::Closed => Err(DashboardError::DialogClosed),
        }
    }

    /// Close the dialog and hand back the draft to apply
    pub fn submit(&mut self) -> Result<AssetRecord, DashboardError> {
        match std::mem::replace(&mut self.state, DialogState::Closed) {
            DialogState::Open { draft, .. } => Ok(draft),
            DialogState::Closed => Err(DashboardError::DialogClosed),
        }
    }

    /// Close without applying anything; also drops a pending selection
    pub fn cancel(&mut self) {
        self.state = DialogState::Closed;
        self.pending = None;
    }

    pub fn to_response(&self) -> DialogResponse {
        let (original, draft) = match &self.state {
            DialogState::Open { original, draft } => (Some(original.clone()), Some(draft.clone())),
            DialogState::Closed => (None, None),
        };
        DialogResponse {
            open: self.is_open(),
            original,
            draft,
            pending_id: self.pending_id().map(str::to_string),
        }
    }
}

impl Default for EditDialog {
    fn default() -> Self {
        Self::new()
    }
}
