//! Session guard scenarios against a real session store.
//!
//! The guard is mounted exactly as the binaries mount it; only the profile
//! lookup and the navigator are in-memory.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use vendor_dash_admin::guard::{
    Denial, GuardHandle, GuardView, Route, SessionGuard, UnauthorizedReason,
};
use vendor_dash_admin::session::{AuthEvent, SessionStore};
use vendor_dash_core::{Role, UserId};
use vendor_dash_integration_tests::{MemoryProfiles, RecordingNavigator, session};

struct Harness {
    store: SessionStore,
    profiles: Arc<MemoryProfiles>,
    navigator: Arc<RecordingNavigator>,
    guard: GuardHandle,
}

fn mount(store: SessionStore, profiles: MemoryProfiles) -> Harness {
    let profiles = Arc::new(profiles);
    let navigator = Arc::new(RecordingNavigator::default());
    let guard = SessionGuard::new(
        Arc::new(store.clone()),
        profiles.clone(),
        navigator.clone(),
    )
    .mount();

    Harness {
        store,
        profiles,
        navigator,
        guard,
    }
}

fn is_login(view: &GuardView) -> bool {
    matches!(view, GuardView::Login(_))
}

fn is_protected(view: &GuardView) -> bool {
    matches!(view, GuardView::Protected(_))
}

// =============================================================================
// Authorization outcomes
// =============================================================================

#[tokio::test]
async fn test_non_admin_is_sent_to_login_without_protected_frame() {
    let store = SessionStore::new();
    store.publish(AuthEvent::SignedIn(session("c1")));
    let h = mount(store, MemoryProfiles::with_roles(&[("c1", "customer")]));

    // Record every view the guard publishes from mount onwards.
    let mut views = h.guard.subscribe();
    let mut seen = vec![views.borrow_and_update().clone()];
    while !seen.last().is_some_and(is_login) {
        views.changed().await.unwrap();
        seen.push(views.borrow_and_update().clone());
    }

    assert!(seen.iter().all(|v| !is_protected(v)));
    assert_eq!(
        seen.last(),
        Some(&GuardView::Login(Denial::AuthUnauthorized(
            UnauthorizedReason::NotAdmin(Role::parse("customer").unwrap())
        )))
    );
    assert_eq!(h.navigator.routes(), vec![Route::Login]);
}

#[tokio::test]
async fn test_missing_profile_degrades_to_login() {
    let store = SessionStore::new();
    store.publish(AuthEvent::SignedIn(session("ghost")));
    let h = mount(store, MemoryProfiles::default());

    let view = h.guard.settled().await.unwrap();
    let GuardView::Login(Denial::AuthUnauthorized(UnauthorizedReason::RoleUnresolved(reason))) =
        view
    else {
        panic!("expected RoleUnresolved, got {view:?}");
    };
    assert!(reason.contains("ghost"));
    assert_eq!(h.navigator.routes(), vec![Route::Login]);
}

#[tokio::test]
async fn test_sign_in_then_sign_out() {
    let h = mount(
        SessionStore::new(),
        MemoryProfiles::with_roles(&[("a1", "admin")]),
    );

    let view = h.guard.settled().await.unwrap();
    assert_eq!(view, GuardView::Login(Denial::AuthAbsent));

    h.store.publish(AuthEvent::SignedIn(session("a1")));
    let view = h.guard.wait_for(is_protected).await.unwrap();
    assert_eq!(
        view.admin().map(|a| a.email.clone()),
        Some(Some("a1@shop.in".to_owned()))
    );

    h.store.publish(AuthEvent::SignedOut);
    let view = h.guard.wait_for(is_login).await.unwrap();
    assert_eq!(view, GuardView::Login(Denial::AuthAbsent));

    assert_eq!(
        h.navigator.routes(),
        vec![Route::Login, Route::Dashboard, Route::Login]
    );
}

#[tokio::test]
async fn test_role_change_is_picked_up_on_next_event() {
    let store = SessionStore::new();
    store.publish(AuthEvent::SignedIn(session("v1")));
    let h = mount(store, MemoryProfiles::with_roles(&[("v1", "vendor")]));
    assert!(is_login(&h.guard.settled().await.unwrap()));

    h.profiles.set_role("v1", "admin");
    h.store.publish(AuthEvent::TokenRefreshed(session("v1")));
    h.guard.wait_for(is_protected).await.unwrap();

    assert_eq!(h.navigator.routes(), vec![Route::Login, Route::Dashboard]);
}

// =============================================================================
// Churn and cancellation
// =============================================================================

#[tokio::test]
async fn test_churn_ends_on_last_event() {
    let h = mount(
        SessionStore::new(),
        MemoryProfiles::with_roles(&[("a1", "admin")]),
    );
    h.guard.settled().await.unwrap();

    for _ in 0..5 {
        h.store.publish(AuthEvent::SignedIn(session("a1")));
        h.store.publish(AuthEvent::SignedOut);
    }
    h.store.publish(AuthEvent::SignedIn(session("a1")));

    h.guard.wait_for(is_protected).await.unwrap();
    assert_eq!(h.navigator.routes().last(), Some(&Route::Dashboard));
    assert_eq!(h.store.subscriber_count(), 1);
}

#[tokio::test]
async fn test_slow_lookup_is_superseded() {
    let store = SessionStore::new();
    let profiles = MemoryProfiles::with_roles(&[("a1", "admin")]);
    profiles.make_slow("a1");
    store.publish(AuthEvent::SignedIn(session("a1")));
    let h = mount(store, profiles);

    h.profiles.wait_until_parked().await;
    h.store.publish(AuthEvent::SignedOut);
    let view = h.guard.wait_for(is_login).await.unwrap();
    assert_eq!(view, GuardView::Login(Denial::AuthAbsent));

    h.profiles.release();
    tokio::task::yield_now().await;

    assert_eq!(h.guard.view(), GuardView::Login(Denial::AuthAbsent));
    assert_eq!(h.navigator.routes(), vec![Route::Login]);
    assert_eq!(h.profiles.lookups(), vec![UserId::new("a1")]);
}

#[tokio::test]
async fn test_unmount_stops_everything() {
    let h = mount(
        SessionStore::new(),
        MemoryProfiles::with_roles(&[("a1", "admin")]),
    );
    h.guard.settled().await.unwrap();
    assert_eq!(h.store.subscriber_count(), 1);

    let Harness {
        store,
        profiles,
        navigator,
        guard,
    } = h;
    guard.unmount().await;
    assert_eq!(store.subscriber_count(), 0);

    store.publish(AuthEvent::SignedIn(session("a1")));
    tokio::task::yield_now().await;

    assert_eq!(navigator.routes(), vec![Route::Login]);
    assert!(profiles.lookups().is_empty());
}

#[tokio::test]
async fn test_two_guards_share_one_store() {
    let store = SessionStore::new();
    let first = mount(store.clone(), MemoryProfiles::with_roles(&[("a1", "admin")]));
    let second = mount(store.clone(), MemoryProfiles::with_roles(&[("a1", "customer")]));
    assert_eq!(store.subscriber_count(), 2);
    first.guard.settled().await.unwrap();
    second.guard.settled().await.unwrap();

    store.publish(AuthEvent::SignedIn(session("a1")));
    first.guard.wait_for(is_protected).await.unwrap();
    second
        .guard
        .wait_for(|v| matches!(v, GuardView::Login(Denial::AuthUnauthorized(_))))
        .await
        .unwrap();

    assert_eq!(first.navigator.routes(), vec![Route::Login, Route::Dashboard]);
    assert_eq!(second.navigator.routes(), vec![Route::Login]);
}
