// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supervisor reassignment: validation, bulk update, and fan-out.
//!
//! The bulk update is the primary contract; once it commits, no
//! notification or broadcast failure can undo or fail the reassignment.

use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use vigil_config::MessagingConfig;
use vigil_core::events::{SupervisorChangeBroadcast, SupervisorChangeNotice};
use vigil_core::model::{SupervisorAssignment, User};
use vigil_core::traits::{Broadcaster, UserManagement, UserRepository};
use vigil_core::types::{SupervisorChangeKind, UserKey};
use vigil_core::{best_effort, VigilError};

/// Result of a committed reassignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeOutcome {
    /// Rows affected by the bulk update.
    pub affected: u64,
    /// Individual notifications that reached their recipient group.
    pub notified: usize,
}

/// Owns supervisor reassignment and its notifications.
pub struct SupervisorService {
    users: Arc<dyn UserRepository>,
    management: Arc<dyn UserManagement>,
    broadcaster: Arc<dyn Broadcaster>,
    messaging: MessagingConfig,
}

impl SupervisorService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        management: Arc<dyn UserManagement>,
        broadcaster: Arc<dyn Broadcaster>,
        messaging: MessagingConfig,
    ) -> Self {
        Self {
            users,
            management,
            broadcaster,
            messaging,
        }
    }

    /// Validate an assignment without applying it.
    pub async fn validate(&self, assignment: &SupervisorAssignment) -> Result<(), VigilError> {
        if assignment.emails.is_empty() {
            return Err(VigilError::Validation(
                "assignment must name at least one user".into(),
            ));
        }
        for email in &assignment.emails {
            if !is_well_formed_email(email) {
                return Err(VigilError::Validation(format!("malformed email: {email}")));
            }
        }

        match (assignment.kind, assignment.new_supervisor_email.as_deref()) {
            (SupervisorChangeKind::Assign, None) => {
                return Err(VigilError::Validation(
                    "assign requires a supervisor email".into(),
                ));
            }
            (SupervisorChangeKind::Assign, Some(email)) => {
                let supervisor = self
                    .users
                    .resolve(&UserKey::ByEmail(email.to_string()))
                    .await?;
                if !supervisor.role.is_supervisor_capable() {
                    return Err(VigilError::Validation(format!(
                        "{email} cannot supervise: role is {}",
                        supervisor.role
                    )));
                }
            }
            (SupervisorChangeKind::Unassign, Some(_)) => {
                return Err(VigilError::Validation(
                    "unassign must not carry a supervisor email".into(),
                ));
            }
            (SupervisorChangeKind::Unassign, None) => {}
        }

        for email in &assignment.emails {
            let user = self
                .users
                .resolve(&UserKey::ByEmail(email.to_string()))
                .await?;
            if !self.management.can_change_supervisor(&user).await? {
                return Err(VigilError::Validation(format!(
                    "{email} is not eligible for a supervisor change"
                )));
            }
        }
        Ok(())
    }

    /// Validate, apply the bulk update, then fan out notifications. The
    /// per-recipient and aggregate sends are best-effort.
    pub async fn change_supervisor(
        &self,
        assignment: &SupervisorAssignment,
    ) -> Result<ChangeOutcome, VigilError> {
        self.validate(assignment).await?;

        let new_supervisor = match assignment.new_supervisor_email.as_deref() {
            Some(email) => Some(
                self.users
                    .resolve(&UserKey::ByEmail(email.to_string()))
                    .await?,
            ),
            None => None,
        };

        let emails: Vec<String> = assignment
            .emails
            .iter()
            .map(|e| e.to_lowercase())
            .collect();
        let affected = self
            .management
            .reassign_supervisor(&emails, new_supervisor.as_ref().map(|s| s.id.clone()))
            .await
            .map_err(|error| VigilError::Storage {
                message: format!("supervisor reassignment failed: {error}"),
                source: None,
            })?;
        debug!(affected, kind = %assignment.kind, "supervisor reassignment committed");

        let notified = self
            .notify_recipients(&emails, new_supervisor.as_ref())
            .await;
        self.broadcast_refresh(assignment, &emails, new_supervisor.as_ref())
            .await;

        Ok(ChangeOutcome { affected, notified })
    }

    /// Tell each affected user's device group who their supervisor is now.
    /// One recipient failing never stops the loop.
    async fn notify_recipients(&self, emails: &[String], supervisor: Option<&User>) -> usize {
        let notice = SupervisorChangeNotice {
            supervisor_name: supervisor.map(|s| s.display_name.clone()),
        };
        let mut notified = 0;
        for email in emails {
            let group = self.messaging.command_group(email);
            let send = async {
                let payload = serde_json::to_value(&notice)
                    .map_err(|e| VigilError::Internal(e.to_string()))?;
                self.broadcaster.send_to_group(&group, payload).await
            };
            if best_effort("supervisor change notice", send).await.is_some() {
                notified += 1;
            } else {
                warn!(recipient = %email, "supervisor change notice not delivered");
            }
        }
        notified
    }

    /// One aggregate dashboard refresh carrying every affected user. The
    /// reassignment already committed, so a failure here is only logged.
    async fn broadcast_refresh(
        &self,
        assignment: &SupervisorAssignment,
        emails: &[String],
        supervisor: Option<&User>,
    ) {
        let mut names = Vec::with_capacity(emails.len());
        for email in emails {
            // Display-name resolution is cosmetic: fall back to the email.
            let name = best_effort("target name lookup", self.users.find_by_email(email))
                .await
                .flatten()
                .map(|u| u.display_name)
                .unwrap_or_else(|| email.clone());
            names.push(name);
        }

        let change = SupervisorChangeBroadcast {
            emails: emails.to_vec(),
            names,
            supervisor_external_id: supervisor.map(|s| s.external_id.clone()),
            supervisor_name: supervisor.map(|s| s.display_name.clone()),
            kind: assignment.kind,
        };
        best_effort(
            "supervisor change broadcast",
            self.broadcaster.broadcast_supervisor_change(change),
        )
        .await;
    }
}

/// Cheap shape check; the directory remains the source of truth for
/// whether the address exists.
fn is_well_formed_email(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
    });
    re.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vigil_core::types::Role;
    use vigil_test_utils::TestWorld;

    fn service(world: &TestWorld) -> SupervisorService {
        SupervisorService::new(
            world.users.clone(),
            world.management.clone(),
            world.broadcaster.clone(),
            MessagingConfig::default(),
        )
    }

    fn assign(emails: &[&str], supervisor: &str) -> SupervisorAssignment {
        SupervisorAssignment {
            emails: emails.iter().map(|e| e.to_string()).collect(),
            new_supervisor_email: Some(supervisor.to_string()),
            kind: SupervisorChangeKind::Assign,
            requested_at: Utc::now(),
        }
    }

    fn unassign(emails: &[&str]) -> SupervisorAssignment {
        SupervisorAssignment {
            emails: emails.iter().map(|e| e.to_string()).collect(),
            new_supervisor_email: None,
            kind: SupervisorChangeKind::Unassign,
            requested_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn empty_email_list_is_rejected() {
        let world = TestWorld::new();
        let service = service(&world);

        let err = service
            .validate(&assign(&[], "sup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::Validation(_)));
    }

    #[tokio::test]
    async fn malformed_email_is_rejected() {
        let world = TestWorld::new();
        world.supervisor("sup@example.com", "Sam Soto").await;
        let service = service(&world);

        let err = service
            .validate(&assign(&["not-an-email"], "sup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::Validation(_)));
    }

    #[tokio::test]
    async fn new_supervisor_must_be_supervisor_capable() {
        let world = TestWorld::new();
        world.lone_field_user("peer@example.com", "Pete Peer").await;
        world.lone_field_user("pso@example.com", "Pat Field").await;
        let service = service(&world);

        let err = service
            .validate(&assign(&["pso@example.com"], "peer@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::Validation(_)));
    }

    #[tokio::test]
    async fn ineligible_target_is_rejected() {
        let world = TestWorld::new();
        world.supervisor("sup@example.com", "Sam Soto").await;
        let pso = world.lone_field_user("pso@example.com", "Pat Field").await;
        world.management.mark_ineligible(&pso.id).await;
        let service = service(&world);

        let err = service
            .validate(&assign(&["pso@example.com"], "sup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::Validation(_)));
    }

    #[tokio::test]
    async fn reassignment_notifies_each_recipient_and_broadcasts_once() {
        let world = TestWorld::new();
        let sup = world.supervisor("sup@example.com", "Sam Soto").await;
        world.lone_field_user("a@example.com", "Ann Field").await;
        world.lone_field_user("b@example.com", "Ben Field").await;
        world.lone_field_user("c@example.com", "Cal Field").await;
        let service = service(&world);

        let outcome = service
            .change_supervisor(&assign(
                &["a@example.com", "b@example.com", "c@example.com"],
                &sup.email,
            ))
            .await
            .unwrap();

        assert_eq!(outcome.affected, 3);
        assert_eq!(outcome.notified, 3);

        for email in ["a@example.com", "b@example.com", "c@example.com"] {
            let sent = world
                .broadcaster
                .group_payloads(&format!("commands:{email}"))
                .await;
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0]["supervisorName"], "Sam Soto");
        }

        let changes = world.broadcaster.supervisor_changes().await;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].emails.len(), 3);
        assert_eq!(
            changes[0].names,
            vec!["Ann Field", "Ben Field", "Cal Field"]
        );
        assert_eq!(
            changes[0].supervisor_external_id.as_deref(),
            Some(sup.external_id.as_str())
        );
        assert_eq!(changes[0].kind, SupervisorChangeKind::Assign);

        // The bulk update saw the lowercased emails and the supervisor's id,
        // and the aggregate refresh went out after the individual notices.
        let calls = world.management.reassignments().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, Some(sup.id.clone()));
        let events = world.broadcaster.events().await;
        assert!(matches!(
            events.last(),
            Some(vigil_test_utils::SentEvent::SupervisorChange(_))
        ));
    }

    #[tokio::test]
    async fn one_failing_recipient_does_not_stop_the_fan_out() {
        let world = TestWorld::new();
        let sup = world.supervisor("sup@example.com", "Sam Soto").await;
        world.lone_field_user("a@example.com", "Ann Field").await;
        world.lone_field_user("b@example.com", "Ben Field").await;
        world.lone_field_user("c@example.com", "Cal Field").await;
        world.broadcaster.fail_group("commands:b@example.com").await;
        let service = service(&world);

        let outcome = service
            .change_supervisor(&assign(
                &["a@example.com", "b@example.com", "c@example.com"],
                &sup.email,
            ))
            .await
            .unwrap();

        assert_eq!(outcome.affected, 3);
        assert_eq!(outcome.notified, 2);
        assert_eq!(
            world
                .broadcaster
                .group_payloads("commands:a@example.com")
                .await
                .len(),
            1
        );
        assert_eq!(
            world
                .broadcaster
                .group_payloads("commands:c@example.com")
                .await
                .len(),
            1
        );
        // The aggregate broadcast still fired with all three names.
        let changes = world.broadcaster.supervisor_changes().await;
        assert_eq!(changes[0].names.len(), 3);
    }

    #[tokio::test]
    async fn aggregate_broadcast_failure_does_not_fail_the_reassignment() {
        let world = TestWorld::new();
        let sup = world.supervisor("sup@example.com", "Sam Soto").await;
        world.lone_field_user("a@example.com", "Ann Field").await;
        world.broadcaster.fail_supervisor_change();
        let service = service(&world);

        let outcome = service
            .change_supervisor(&assign(&["a@example.com"], &sup.email))
            .await
            .unwrap();
        assert_eq!(outcome.affected, 1);
    }

    #[tokio::test]
    async fn unassign_sends_empty_supervisor_name() {
        let world = TestWorld::new();
        world.lone_field_user("a@example.com", "Ann Field").await;
        let service = service(&world);

        let outcome = service
            .change_supervisor(&unassign(&["a@example.com"]))
            .await
            .unwrap();
        assert_eq!(outcome.affected, 1);

        let sent = world
            .broadcaster
            .group_payloads("commands:a@example.com")
            .await;
        assert!(sent[0]["supervisorName"].is_null());

        let changes = world.broadcaster.supervisor_changes().await;
        assert_eq!(changes[0].kind, SupervisorChangeKind::Unassign);
        assert!(changes[0].supervisor_name.is_none());
    }

    #[tokio::test]
    async fn bulk_update_failure_aborts_before_any_notification() {
        let world = TestWorld::new();
        let sup = world.supervisor("sup@example.com", "Sam Soto").await;
        world.lone_field_user("a@example.com", "Ann Field").await;
        world.management.fail_reassign();
        let service = service(&world);

        let err = service
            .change_supervisor(&assign(&["a@example.com"], &sup.email))
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::Storage { .. }));
        assert!(world
            .broadcaster
            .group_payloads("commands:a@example.com")
            .await
            .is_empty());
        assert!(world.broadcaster.supervisor_changes().await.is_empty());
    }

    #[tokio::test]
    async fn admins_can_supervise() {
        let world = TestWorld::new();
        world.users.seed("admin@example.com", "Ada Admin", Role::Admin).await;
        world.lone_field_user("a@example.com", "Ann Field").await;
        let service = service(&world);

        service
            .validate(&assign(&["a@example.com"], "admin@example.com"))
            .await
            .unwrap();
    }

    #[test]
    fn email_shape_check() {
        assert!(is_well_formed_email("pso@example.com"));
        assert!(is_well_formed_email("a.b+tag@sub.example.co"));
        assert!(!is_well_formed_email("pso@example"));
        assert!(!is_well_formed_email("pso example.com"));
        assert!(!is_well_formed_email("@example.com"));
        assert!(!is_well_formed_email(""));
    }
}
