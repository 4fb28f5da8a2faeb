//! Behavioural coverage for the ride lifecycle service over fixture
//! adapters.

use std::sync::Arc;

use chrono::Utc;
use rstest::rstest;
use uuid::Uuid;

use crate::domain::events::RideEventKind;
use crate::domain::ports::{
    BroadcastRideEvents, BrowsePendingRequest, CancelRideRequest, FixtureProfileRepository,
    FixtureRideRepository, ProfileRepository, ReportPositionRequest, RequestRideRequest,
    RideCommands, RideQueries,
};
use crate::domain::profile::{AccountStatus, Actor, Profile, Role};
use crate::domain::ride::{GeoPoint, ADMIN_CANCELLATION_REASON};
use crate::domain::{Error, ErrorCode};

use super::RideService;

type Service =
    RideService<FixtureRideRepository, FixtureProfileRepository, BroadcastRideEvents>;

struct Harness {
    service: Service,
    events: Arc<BroadcastRideEvents>,
    passenger: Actor,
    driver: Actor,
}

fn profile(id: Uuid, name: &str, role: Role, status: AccountStatus) -> Profile {
    Profile::restore(id, name, None, role, status, Utc::now()).expect("valid profile")
}

fn actor(role: Role) -> Actor {
    Actor {
        id: Uuid::new_v4(),
        role,
    }
}

fn harness() -> Harness {
    harness_with(true)
}

fn harness_with(simulation_enabled: bool) -> Harness {
    let passenger = actor(Role::Passenger);
    let driver = actor(Role::Driver);
    let profiles = Arc::new(FixtureProfileRepository::with_profiles([
        profile(
            passenger.id,
            "Pia Passenger",
            Role::Passenger,
            AccountStatus::Active,
        ),
        profile(driver.id, "Dan Driver", Role::Driver, AccountStatus::Active),
    ]));
    let rides = Arc::new(FixtureRideRepository::new());
    let events = Arc::new(BroadcastRideEvents::new());
    let service = RideService::new(rides, profiles, Arc::clone(&events), simulation_enabled);
    Harness {
        service,
        events,
        passenger,
        driver,
    }
}

fn ride_request(passenger_id: Uuid) -> RequestRideRequest {
    RequestRideRequest {
        passenger_id,
        pickup_text: "Central station".into(),
        pickup_point: Some(GeoPoint::new(52.52, 13.40).expect("valid point")),
        destination_text: "Airport".into(),
        destination_point: Some(GeoPoint::new(52.36, 13.51).expect("valid point")),
        passengers_count: 2,
    }
}

fn admin() -> Actor {
    actor(Role::Admin)
}

fn detail_code(error: &Error) -> Option<&str> {
    error.details().and_then(|d| d["code"].as_str())
}

mod request_ride {
    use super::*;
    use crate::domain::ports::RideEvents;

    #[rstest]
    #[actix_rt::test]
    async fn creates_a_pending_ride_and_publishes() {
        let h = harness();
        let mut rx = h.events.subscribe();

        let view = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");

        assert_eq!(view.passenger.id, h.passenger.id);
        assert!(view.driver.is_none());
        let event = rx.try_recv().expect("event published");
        assert_eq!(event.kind, RideEventKind::Requested);
        assert_eq!(event.ride_id, view.id);
    }

    #[rstest]
    #[actix_rt::test]
    async fn rejects_blank_pickup() {
        let h = harness();
        let mut request = ride_request(h.passenger.id);
        request.pickup_text = "   ".into();
        let error = h
            .service
            .request_ride(h.passenger, request)
            .await
            .expect_err("blank pickup");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            error.details().and_then(|d| d["field"].as_str()),
            Some("pickup")
        );
    }

    #[rstest]
    #[case(0)]
    #[case(11)]
    #[actix_rt::test]
    async fn rejects_passenger_counts_out_of_range(#[case] count: i32) {
        let h = harness();
        let mut request = ride_request(h.passenger.id);
        request.passengers_count = count;
        let error = h
            .service
            .request_ride(h.passenger, request)
            .await
            .expect_err("invalid count");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[actix_rt::test]
    async fn rejects_a_second_active_ride() {
        let h = harness();
        h.service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("first ride");
        let error = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect_err("second active ride");
        assert_eq!(error.code(), ErrorCode::Conflict);
        assert_eq!(detail_code(&error), Some("active_ride_exists"));
    }

    #[rstest]
    #[case(AccountStatus::Suspended)]
    #[case(AccountStatus::Banned)]
    #[actix_rt::test]
    async fn rejects_blocked_accounts(#[case] status: AccountStatus) {
        let blocked = actor(Role::Passenger);
        let profiles = FixtureProfileRepository::with_profiles([profile(
            blocked.id,
            "Sam",
            Role::Passenger,
            status,
        )]);
        let service = RideService::new(
            Arc::new(FixtureRideRepository::new()),
            Arc::new(profiles),
            Arc::new(BroadcastRideEvents::new()),
            false,
        );
        let error = service
            .request_ride(blocked, ride_request(blocked.id))
            .await
            .expect_err("blocked account");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[actix_rt::test]
    async fn rejects_unknown_accounts() {
        let h = harness();
        let stranger = actor(Role::Passenger);
        let error = h
            .service
            .request_ride(stranger, ride_request(stranger.id))
            .await
            .expect_err("no profile");
        assert_eq!(error.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    #[actix_rt::test]
    async fn driver_accounts_cannot_request() {
        let h = harness();
        let error = h
            .service
            .request_ride(h.driver, ride_request(h.driver.id))
            .await
            .expect_err("not a passenger account");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[actix_rt::test]
    async fn users_cannot_request_for_someone_else() {
        let h = harness();
        let error = h
            .service
            .request_ride(h.driver, ride_request(h.passenger.id))
            .await
            .expect_err("not the passenger");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[actix_rt::test]
    async fn admins_may_request_on_behalf_of_a_passenger() {
        let h = harness();
        let view = h
            .service
            .request_ride(admin(), ride_request(h.passenger.id))
            .await
            .expect("admin creates for passenger");
        assert_eq!(view.passenger.id, h.passenger.id);
    }
}

mod payload_validation {
    //! Invalid payloads must be rejected without touching storage. The
    //! mocks carry no expectations, so any repository call panics.

    use super::*;
    use crate::domain::ports::{MockProfileRepository, MockRideRepository};

    fn service_over_mocks() -> RideService<MockRideRepository, MockProfileRepository, BroadcastRideEvents>
    {
        RideService::new(
            Arc::new(MockRideRepository::new()),
            Arc::new(MockProfileRepository::new()),
            Arc::new(BroadcastRideEvents::new()),
            true,
        )
    }

    #[rstest]
    #[actix_rt::test]
    async fn blank_pickup_never_reaches_storage() {
        let service = service_over_mocks();
        let requester = actor(Role::Passenger);
        let mut request = ride_request(requester.id);
        request.pickup_text = "  ".into();
        let error = service
            .request_ride(requester, request)
            .await
            .expect_err("blank pickup");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[case(0)]
    #[case(11)]
    #[actix_rt::test]
    async fn out_of_range_counts_never_reach_storage(#[case] count: i32) {
        let service = service_over_mocks();
        let requester = actor(Role::Passenger);
        let mut request = ride_request(requester.id);
        request.passengers_count = count;
        let error = service
            .request_ride(requester, request)
            .await
            .expect_err("invalid count");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[case("teleport", None)]
    #[case("custom", Some("  "))]
    #[actix_rt::test]
    async fn bad_cancellation_reasons_never_reach_storage(
        #[case] code: &str,
        #[case] text: Option<&str>,
    ) {
        let service = service_over_mocks();
        let error = service
            .cancel_ride(
                actor(Role::Passenger),
                CancelRideRequest {
                    ride_id: Uuid::new_v4(),
                    reason_code: code.into(),
                    custom_text: text.map(str::to_owned),
                },
            )
            .await
            .expect_err("invalid reason");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }
}

mod accept_ride {
    use super::*;
    use crate::domain::ports::RideEvents;

    #[rstest]
    #[actix_rt::test]
    async fn assigns_the_driver_and_publishes() {
        let h = harness();
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        let mut rx = h.events.subscribe();

        let view = h
            .service
            .accept_ride(h.driver, ride.id)
            .await
            .expect("ride accepted");

        assert_eq!(view.driver.as_ref().map(|d| d.id), Some(h.driver.id));
        let event = rx.try_recv().expect("event published");
        assert_eq!(event.kind, RideEventKind::Accepted);
        assert_eq!(event.driver_id, Some(h.driver.id));
    }

    #[rstest]
    #[actix_rt::test]
    async fn passenger_accounts_cannot_accept() {
        let h = harness();
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        let error = h
            .service
            .accept_ride(h.passenger, ride.id)
            .await
            .expect_err("not a driver account");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[actix_rt::test]
    async fn losing_the_race_returns_conflict_with_fresh_state() {
        let h = harness();
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        h.service
            .accept_ride(h.driver, ride.id)
            .await
            .expect("first driver wins");

        let loser = actor(Role::Driver);
        // The loser needs a profile to get past the account check.
        let error = {
            let profiles = h.service.profiles_for_tests();
            profiles
                .save(&profile(
                    loser.id,
                    "Lola Loser",
                    Role::Driver,
                    AccountStatus::Active,
                ))
                .await
                .expect("profile saved");
            h.service
                .accept_ride(loser, ride.id)
                .await
                .expect_err("ride already taken")
        };
        assert_eq!(error.code(), ErrorCode::Conflict);
        let refreshed = error
            .details()
            .and_then(|d| d["ride"]["driver"]["id"].as_str())
            .map(str::to_owned);
        assert_eq!(refreshed, Some(h.driver.id.to_string()));
    }

    #[rstest]
    #[actix_rt::test]
    async fn missing_ride_is_not_found() {
        let h = harness();
        let error = h
            .service
            .accept_ride(h.driver, Uuid::new_v4())
            .await
            .expect_err("no such ride");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[actix_rt::test]
    async fn a_driver_with_an_active_ride_cannot_accept_another() {
        let h = harness();
        let first = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("first ride");
        h.service
            .accept_ride(h.driver, first.id)
            .await
            .expect("driver takes first ride");

        let other_passenger = actor(Role::Passenger);
        h.service
            .profiles_for_tests()
            .save(&profile(
                other_passenger.id,
                "Pam",
                Role::Passenger,
                AccountStatus::Active,
            ))
            .await
            .expect("profile saved");
        let second = h
            .service
            .request_ride(other_passenger, ride_request(other_passenger.id))
            .await
            .expect("second ride");

        let error = h
            .service
            .accept_ride(h.driver, second.id)
            .await
            .expect_err("driver already busy");
        assert_eq!(error.code(), ErrorCode::Conflict);
        assert_eq!(detail_code(&error), Some("active_ride_exists"));
    }
}

mod complete_ride {
    use super::*;

    #[rstest]
    #[actix_rt::test]
    async fn assigned_driver_completes() {
        let h = harness();
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        h.service
            .accept_ride(h.driver, ride.id)
            .await
            .expect("ride accepted");

        let view = h
            .service
            .complete_ride(h.driver, ride.id)
            .await
            .expect("ride completed");
        assert_eq!(view.status, crate::domain::ride::RideStatus::Completed);
    }

    #[rstest]
    #[actix_rt::test]
    async fn passenger_cannot_complete() {
        let h = harness();
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        h.service
            .accept_ride(h.driver, ride.id)
            .await
            .expect("ride accepted");

        let error = h
            .service
            .complete_ride(h.passenger, ride.id)
            .await
            .expect_err("passenger completion");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[actix_rt::test]
    async fn pending_ride_cannot_complete() {
        let h = harness();
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        let error = h
            .service
            .complete_ride(h.driver, ride.id)
            .await
            .expect_err("no driver yet");
        assert_eq!(error.code(), ErrorCode::Conflict);
        assert_eq!(detail_code(&error), Some("invalid_transition"));
    }
}

mod cancel_ride {
    use super::*;

    fn cancel(ride_id: Uuid, code: &str, text: Option<&str>) -> CancelRideRequest {
        CancelRideRequest {
            ride_id,
            reason_code: code.into(),
            custom_text: text.map(str::to_owned),
        }
    }

    #[rstest]
    #[actix_rt::test]
    async fn passenger_cancels_with_a_canned_reason() {
        let h = harness();
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        let view = h
            .service
            .cancel_ride(h.passenger, cancel(ride.id, "waited_too_long", None))
            .await
            .expect("ride cancelled");
        assert_eq!(
            view.cancellation_reason.as_deref(),
            Some("Waited too long for a driver")
        );
    }

    #[rstest]
    #[actix_rt::test]
    async fn custom_reason_requires_text() {
        let h = harness();
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        let error = h
            .service
            .cancel_ride(h.passenger, cancel(ride.id, "custom", Some("  ")))
            .await
            .expect_err("blank custom text");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[actix_rt::test]
    async fn admin_cancellation_uses_the_fixed_reason() {
        let h = harness();
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        let the_admin = admin();
        h.service
            .profiles_for_tests()
            .save(&profile(
                the_admin.id,
                "Ada Admin",
                Role::Admin,
                AccountStatus::Active,
            ))
            .await
            .expect("profile saved");

        let view = h
            .service
            .cancel_ride(the_admin, cancel(ride.id, "ignored", None))
            .await
            .expect("admin cancels");
        assert_eq!(
            view.cancellation_reason.as_deref(),
            Some(ADMIN_CANCELLATION_REASON)
        );
    }

    #[rstest]
    #[actix_rt::test]
    async fn repeat_cancellation_is_a_conflict() {
        let h = harness();
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        h.service
            .cancel_ride(h.passenger, cancel(ride.id, "change_of_plans", None))
            .await
            .expect("first cancellation");
        let error = h
            .service
            .cancel_ride(h.passenger, cancel(ride.id, "change_of_plans", None))
            .await
            .expect_err("second cancellation");
        assert_eq!(error.code(), ErrorCode::Conflict);
        assert_eq!(detail_code(&error), Some("already_applied"));
    }
}

mod positions {
    use super::*;

    #[rstest]
    #[actix_rt::test]
    async fn assigned_driver_reports_position() {
        let h = harness();
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        h.service
            .accept_ride(h.driver, ride.id)
            .await
            .expect("ride accepted");

        let point = GeoPoint::new(52.50, 13.45).expect("valid point");
        let view = h
            .service
            .report_position(
                h.driver,
                ReportPositionRequest {
                    ride_id: ride.id,
                    point,
                },
            )
            .await
            .expect("position recorded");
        assert_eq!(view.driver_position, Some(point));
    }

    #[rstest]
    #[actix_rt::test]
    async fn simulation_must_be_enabled() {
        let h = harness_with(false);
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        h.service
            .accept_ride(h.driver, ride.id)
            .await
            .expect("ride accepted");
        let error = h
            .service
            .simulate_position_step(h.driver, ride.id)
            .await
            .expect_err("simulation off");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[actix_rt::test]
    async fn simulation_steps_toward_the_destination() {
        let h = harness_with(true);
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        h.service
            .accept_ride(h.driver, ride.id)
            .await
            .expect("ride accepted");

        let view = h
            .service
            .simulate_position_step(h.driver, ride.id)
            .await
            .expect("one step");
        let position = view.driver_position.expect("position set");
        // Starts from the pickup and moves strictly toward the destination.
        assert!(position.lat() < 52.52 && position.lat() > 52.36);
    }
}

mod delete_ride {
    use super::*;

    #[rstest]
    #[actix_rt::test]
    async fn active_rides_cannot_be_deleted() {
        let h = harness();
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        let error = h
            .service
            .delete_ride(h.passenger, ride.id)
            .await
            .expect_err("ride still active");
        assert_eq!(error.code(), ErrorCode::Conflict);
        assert_eq!(detail_code(&error), Some("ride_still_active"));
    }

    #[rstest]
    #[actix_rt::test]
    async fn terminal_rides_can_be_deleted_by_participants() {
        let h = harness();
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        h.service
            .cancel_ride(
                h.passenger,
                CancelRideRequest {
                    ride_id: ride.id,
                    reason_code: "change_of_plans".into(),
                    custom_text: None,
                },
            )
            .await
            .expect("ride cancelled");

        h.service
            .delete_ride(h.passenger, ride.id)
            .await
            .expect("ride deleted");
        let error = h
            .service
            .ride(h.passenger, ride.id)
            .await
            .expect_err("ride gone");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }
}

mod queries {
    use super::*;

    #[rstest]
    #[actix_rt::test]
    async fn drivers_browse_pending_rides() {
        let h = harness();
        h.service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");

        let listed = h
            .service
            .browse_pending(h.driver, BrowsePendingRequest::default())
            .await
            .expect("driver browses");
        assert_eq!(listed.items.len(), 1);
    }

    #[rstest]
    #[actix_rt::test]
    async fn passengers_cannot_browse_pending_rides() {
        let h = harness();
        h.service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");

        let error = h
            .service
            .browse_pending(h.passenger, BrowsePendingRequest::default())
            .await
            .expect_err("not a driver account");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[actix_rt::test]
    async fn admins_browse_without_a_profile() {
        let h = harness();
        h.service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");

        let listed = h
            .service
            .browse_pending(admin(), BrowsePendingRequest::default())
            .await
            .expect("admin browses");
        assert_eq!(listed.items.len(), 1);
    }

    #[rstest]
    #[actix_rt::test]
    async fn strangers_cannot_view_accepted_rides() {
        let h = harness();
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        h.service
            .accept_ride(h.driver, ride.id)
            .await
            .expect("ride accepted");

        let stranger = actor(Role::Passenger);
        let error = h
            .service
            .ride(stranger, ride.id)
            .await
            .expect_err("not a participant");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[actix_rt::test]
    async fn my_rides_lists_both_sides() {
        let h = harness();
        let ride = h
            .service
            .request_ride(h.passenger, ride_request(h.passenger.id))
            .await
            .expect("ride created");
        h.service
            .accept_ride(h.driver, ride.id)
            .await
            .expect("ride accepted");

        let passenger_rides = h.service.my_rides(h.passenger).await.expect("list");
        let driver_rides = h.service.my_rides(h.driver).await.expect("list");
        assert_eq!(passenger_rides.len(), 1);
        assert_eq!(driver_rides.len(), 1);
    }
}
