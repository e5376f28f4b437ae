use crate::models::{Participant, ParticipantStatus};

/// Table filters of the participants view. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantFilter {
    pub event: Option<String>,
    pub status: Option<ParticipantStatus>,
    pub search: Option<String>,
}

impl ParticipantFilter {
    pub fn matches(&self, participant: &Participant) -> bool {
        let event_ok = match self.event.as_deref().map(str::trim) {
            None | Some("") | Some("all") => true,
            Some(event) => participant.event == event,
        };
        let status_ok = self.status.map_or(true, |s| participant.status == s);

        let needle = self
            .search
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_lowercase();
        let search_ok = needle.is_empty()
            || participant.email.to_lowercase().contains(&needle)
            || participant
                .names
                .iter()
                .any(|n| n.to_lowercase().contains(&needle));

        event_ok && status_ok && search_ok
    }

    pub fn apply<'a>(&self, participants: &'a [Participant]) -> Vec<&'a Participant> {
        participants.iter().filter(|p| self.matches(p)).collect()
    }
}

/// Event names in the order they first appear.
pub fn distinct_events(participants: &[Participant]) -> Vec<String> {
    let mut events: Vec<String> = Vec::new();
    for participant in participants {
        if !events.iter().any(|e| *e == participant.event) {
            events.push(participant.event.clone());
        }
    }
    events
}
