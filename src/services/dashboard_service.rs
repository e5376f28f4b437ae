use serde::Serialize;

use crate::models::{Participant, ParticipantStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventCount {
    pub event: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
    pub pending: usize,
    pub by_event: Vec<EventCount>,
}

impl DashboardSummary {
    pub fn from_participants(participants: &[Participant]) -> Self {
        let mut summary = Self {
            total: participants.len(),
            ..Self::default()
        };

        for participant in participants {
            match participant.status {
                ParticipantStatus::Approved => summary.approved += 1,
                ParticipantStatus::Rejected => summary.rejected += 1,
                ParticipantStatus::Pending => summary.pending += 1,
            }

            match summary
                .by_event
                .iter_mut()
                .find(|e| e.event == participant.event)
            {
                Some(entry) => entry.count += 1,
                None => summary.by_event.push(EventCount {
                    event: participant.event.clone(),
                    count: 1,
                }),
            }
        }

        summary
    }

    /// Label/count pairs for the status chart.
    pub fn status_breakdown(&self) -> [(&'static str, usize); 3] {
        [
            ("Approved", self.approved),
            ("Rejected", self.rejected),
            ("Pending", self.pending),
        ]
    }
}
