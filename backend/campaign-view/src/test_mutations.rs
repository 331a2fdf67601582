// backend/campaign-view/src/test_mutations.rs
//
// Mutation service tests.
//
// Covers:
//   - create_campaign: input coercion, eventual directory visibility
//   - add_tier: validation before submit, ledger-side authorization,
//     refetch instead of local append
//   - pledge: exact amount, index range and shift detection, concurrent
//     pledges both counted
//   - remove_tier: stale selections rejected
//   - failures: rejected submission, revert, unconfirmed transaction

use crate::test::{alice, bob, setup, DAY, NOW};
use crate::testutils::{Fault, InMemoryLedger};
use crate::{
    Address, ErrorCategory, GatewayError, MutationError, MutationEvent, MutationStatus,
    NewCampaign, ReadFailure, Snapshot, Tier, ValidationFailure,
};

// ─── Helpers ─────────────────────────────────────────────

async fn campaign_with_tiers(ledger: &InMemoryLedger) -> Address {
    let campaign = ledger
        .seed_campaign(&alice(), "Community Garden", 1000, NOW + 14 * DAY)
        .await;
    ledger.seed_tier(&campaign, "Seed", 10).await;
    ledger.seed_tier(&campaign, "Sprout", 50).await;
    campaign
}

fn new_campaign(goal: i128, duration_days: i64) -> NewCampaign {
    NewCampaign {
        name: "Library".to_string(),
        description: "Books for everyone".to_string(),
        goal,
        duration_days,
    }
}

// ─── 1. create_campaign ──────────────────────────────────

#[tokio::test]
async fn test_create_campaign_coerces_inputs() {
    let (_, core, _) = setup();

    let pending = core
        .mutations
        .create_campaign(&alice(), new_campaign(-5, 0))
        .await
        .unwrap();
    let event = pending.confirmed().await.into_result().unwrap();

    match event {
        MutationEvent::CampaignDeployed(deployed) => {
            assert_eq!(deployed.goal, 1);
            assert_eq!(deployed.duration_days, 1);
            assert_eq!(deployed.owner, alice());
            assert!(deployed.campaign.is_some());
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_created_campaign_appears_on_next_poll() {
    let (_, core, _) = setup();
    assert!(core.directory.list_by_owner(&alice()).await.is_empty());

    let pending = core
        .mutations
        .create_campaign(&alice(), new_campaign(5_000, 30))
        .await
        .unwrap();
    let status = pending.confirmed().await;
    assert!(status.is_confirmed());

    // Not pushed: the cached listing is only marked stale.
    let cached = core.directory.cached_by_owner(&alice()).await;
    assert!(matches!(cached, Snapshot::Stale(_)));
    assert!(cached.view().unwrap().is_empty());

    let listing = core.directory.list_by_owner(&alice()).await;
    assert_eq!(listing.len(), 1);
    let summary = &listing.items()[0];
    assert_eq!(summary.name, "Library");

    let view = core.reader.read_campaign(&summary.address).await;
    assert_eq!(view.goal.ready(), Some(&5_000));
    assert_eq!(view.deadline.ready(), Some(&(NOW + 30 * DAY)));
}

// ─── 2. add_tier ─────────────────────────────────────────

#[tokio::test]
async fn test_add_tier_lands_last_with_no_backers() {
    let (ledger, core, _) = setup();
    let campaign = campaign_with_tiers(&ledger).await;
    let before = core.reader.read_campaign(&campaign).await;
    assert_eq!(before.tiers.len(), 2);

    let pending = core
        .mutations
        .add_tier(&alice(), &campaign, "Bronze", 10)
        .await
        .unwrap();
    assert!(matches!(pending.status(), MutationStatus::Submitted { .. }));
    assert!(pending.confirmed().await.is_confirmed());

    // Stale snapshot still shows the old roster; nothing was appended locally.
    let stale = core.reader.snapshot(&campaign).await;
    assert!(matches!(stale, Snapshot::Stale(_)));
    assert_eq!(stale.view().unwrap().tiers.len(), 2);

    let tiers = core.tiers.list_tiers(&campaign).await;
    assert_eq!(
        tiers.items().last(),
        Some(&Tier {
            name: "Bronze".to_string(),
            amount: 10,
            backers: 0,
        })
    );
    assert_eq!(tiers.len(), 3);
}

#[tokio::test]
async fn test_add_tier_zero_amount_never_submitted() {
    let (ledger, core, _) = setup();
    let campaign = campaign_with_tiers(&ledger).await;

    let err = core
        .mutations
        .add_tier(&alice(), &campaign, "Free", 0)
        .await
        .err()
        .unwrap();

    assert_eq!(
        err,
        MutationError::Validation(ValidationFailure::TierAmountBelowMinimum)
    );
    assert_eq!(ledger.submissions().await, 0);
}

#[tokio::test]
async fn test_add_tier_by_non_owner_is_authorization_failure() {
    let (ledger, core, _) = setup();
    let campaign = campaign_with_tiers(&ledger).await;
    core.reader.read_campaign(&campaign).await;

    // Submitted without a local role check; the ledger rejects it.
    let pending = core
        .mutations
        .add_tier(&bob(), &campaign, "Gold", 100)
        .await
        .unwrap();
    let err = pending.confirmed().await.into_result().unwrap_err();

    assert!(matches!(err, MutationError::Authorization(_)));
    assert_eq!(err.category(), ErrorCategory::Capability);
    assert_eq!(core.tiers.list_tiers(&campaign).await.len(), 2);
    // Failure leaves the cached view untouched.
    assert!(core.reader.snapshot(&campaign).await.is_fresh());
}

// ─── 3. pledge ───────────────────────────────────────────

#[tokio::test]
async fn test_pledge_updates_balance_and_backers_after_refetch() {
    let (ledger, core, _) = setup();
    let campaign = campaign_with_tiers(&ledger).await;
    let view = core.reader.read_campaign(&campaign).await;
    let selection = view.select_tier(1).unwrap();

    let status = core
        .mutations
        .pledge(&bob(), &selection, 50)
        .await
        .unwrap()
        .confirmed()
        .await;

    match status.into_result().unwrap() {
        MutationEvent::PledgeConfirmed(pledge) => {
            assert_eq!(pledge.backer, bob());
            assert_eq!(pledge.tier_index, 1);
            assert_eq!(pledge.amount, 50);
        }
        other => panic!("unexpected event {other:?}"),
    }

    // The cached view is not patched.
    let stale = core.reader.snapshot(&campaign).await;
    assert!(!stale.is_fresh());
    assert_eq!(stale.view().unwrap().balance.ready(), Some(&0));

    let fresh = core.reader.read_campaign(&campaign).await;
    assert_eq!(fresh.balance.ready(), Some(&50));
    assert_eq!(fresh.tiers.items()[1].backers, 1);
    assert_eq!(fresh.progress.ready().unwrap().to_string(), "5.00%");
}

#[tokio::test]
async fn test_concurrent_pledges_both_count() {
    let (ledger, core, _) = setup();
    let campaign = campaign_with_tiers(&ledger).await;
    let view = core.reader.read_campaign(&campaign).await;
    let selection = view.select_tier(0).unwrap();

    let carol = Address::from("0xca201");
    let pledge = |caller: Address| {
        let selection = selection.clone();
        let mutations = &core.mutations;
        async move {
            mutations
                .pledge(&caller, &selection, 10)
                .await
                .unwrap()
                .confirmed()
                .await
        }
    };
    let (first, second) = tokio::join!(pledge(bob()), pledge(carol));
    assert!(first.is_confirmed());
    assert!(second.is_confirmed());

    let fresh = core.reader.read_campaign(&campaign).await;
    assert_eq!(fresh.tiers.items()[0].backers, 2);
    assert_eq!(fresh.balance.ready(), Some(&20));
}

#[tokio::test]
async fn test_pledge_amount_must_match_tier() {
    let (ledger, core, _) = setup();
    let campaign = campaign_with_tiers(&ledger).await;
    let selection = core.reader.read_campaign(&campaign).await.select_tier(1).unwrap();

    let err = core
        .mutations
        .pledge(&bob(), &selection, 49)
        .await
        .err()
        .unwrap();

    assert_eq!(
        err,
        MutationError::Validation(ValidationFailure::PledgeAmountMismatch {
            expected: 50,
            offered: 49,
        })
    );
    assert!(err.is_local());
    assert_eq!(ledger.submissions().await, 0);
}

#[tokio::test]
async fn test_pledge_to_vanished_index_fails() {
    let (ledger, core, _) = setup();
    let campaign = campaign_with_tiers(&ledger).await;
    let view = core.reader.read_campaign(&campaign).await;
    let last = view.select_tier(1).unwrap();
    assert_eq!(last.tier.name, "Sprout");

    // Owner removes the last tier out from under the pledger.
    core.mutations
        .remove_tier(&alice(), &last)
        .await
        .unwrap()
        .confirmed()
        .await
        .into_result()
        .unwrap();

    let err = core
        .mutations
        .pledge(&bob(), &last, 50)
        .await
        .err()
        .unwrap();
    assert_eq!(
        err,
        MutationError::Validation(ValidationFailure::TierIndexOutOfRange { index: 1, len: 1 })
    );
}

#[tokio::test]
async fn test_pledge_to_shifted_tier_fails() {
    let (ledger, core, _) = setup();
    let campaign = campaign_with_tiers(&ledger).await;
    let view = core.reader.read_campaign(&campaign).await;
    let first = view.select_tier(0).unwrap();

    core.mutations
        .remove_tier(&alice(), &first)
        .await
        .unwrap()
        .confirmed()
        .await
        .into_result()
        .unwrap();
    assert_eq!(ledger.tier(&campaign, 0).await.unwrap().name, "Sprout");

    let err = core
        .mutations
        .pledge(&bob(), &first, 10)
        .await
        .err()
        .unwrap();
    assert_eq!(
        err,
        MutationError::Validation(ValidationFailure::TierChanged { index: 0 })
    );
    assert_eq!(ledger.tier(&campaign, 0).await.unwrap().backers, 0);
}

#[tokio::test]
async fn test_pledge_with_unreadable_roster_fails_locally() {
    let (ledger, core, _) = setup();
    let campaign = campaign_with_tiers(&ledger).await;
    let selection = core.reader.read_campaign(&campaign).await.select_tier(0).unwrap();
    ledger.inject_read_fault(&campaign, "tiers", Fault::Hang).await;

    let err = core
        .mutations
        .pledge(&bob(), &selection, 10)
        .await
        .err()
        .unwrap();

    assert_eq!(
        err,
        MutationError::Validation(ValidationFailure::TierRosterUnavailable(
            ReadFailure::Timeout
        ))
    );
    assert_eq!(ledger.submissions().await, 0);
}

#[tokio::test]
async fn test_pledge_reverted_by_ledger() {
    let (ledger, core, _) = setup();
    let campaign = campaign_with_tiers(&ledger).await;
    let selection = core.reader.read_campaign(&campaign).await.select_tier(0).unwrap();
    ledger.set_state(&campaign, 2).await;

    let err = core
        .mutations
        .pledge(&bob(), &selection, 10)
        .await
        .unwrap()
        .confirmed()
        .await
        .into_result()
        .unwrap_err();

    assert_eq!(
        err,
        MutationError::Transaction("reverted: campaign is not active".to_string())
    );
    assert!(core.reader.snapshot(&campaign).await.is_fresh());
}

// ─── 4. remove_tier ──────────────────────────────────────

#[tokio::test]
async fn test_remove_tier_by_non_owner_rejected_by_ledger() {
    let (ledger, core, _) = setup();
    let campaign = campaign_with_tiers(&ledger).await;
    let selection = core.reader.read_campaign(&campaign).await.select_tier(0).unwrap();

    let err = core
        .mutations
        .remove_tier(&bob(), &selection)
        .await
        .unwrap()
        .confirmed()
        .await
        .into_result()
        .unwrap_err();

    assert!(matches!(err, MutationError::Authorization(_)));
    assert_eq!(core.tiers.list_tiers(&campaign).await.len(), 2);
}

// ─── 5. Submission and confirmation failures ─────────────

#[tokio::test]
async fn test_rejected_submission_is_transaction_failure() {
    let (ledger, core, _) = setup();
    ledger
        .reject_submissions(Some(GatewayError::Unavailable("wallet disconnected".into())))
        .await;

    let err = core
        .mutations
        .create_campaign(&alice(), new_campaign(100, 7))
        .await
        .err()
        .unwrap();

    assert_eq!(err.category(), ErrorCategory::Operation);
    assert_eq!(ledger.submissions().await, 0);
}

#[tokio::test]
async fn test_unconfirmed_pledge_does_not_invalidate() {
    let (ledger, core, _) = setup();
    let campaign = campaign_with_tiers(&ledger).await;
    let selection = core.reader.read_campaign(&campaign).await.select_tier(0).unwrap();
    ledger.stall_confirmations(true).await;

    let status = core
        .mutations
        .pledge(&bob(), &selection, 10)
        .await
        .unwrap()
        .confirmed()
        .await;

    assert!(matches!(
        status,
        MutationStatus::Failed {
            error: MutationError::Transaction(_)
        }
    ));
    assert!(core.reader.snapshot(&campaign).await.is_fresh());

    // The ledger may still include the abandoned transaction later.
    ledger.settle_all().await;
    let fresh = core.reader.read_campaign(&campaign).await;
    assert_eq!(fresh.balance.ready(), Some(&10));
    assert_eq!(fresh.tiers.items()[0].backers, 1);
}
