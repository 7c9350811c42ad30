mod common;

use anyhow::Result;
use std::time::Duration;
use teloxide::types::{ChatId, UserId};

use common::{TestBot, ADMIN, CHAT, MEMBER};
use places_bot::bot::dialogue::FlowSettings;
use places_bot::bot::state::{AddStep, DialogueState, RateStep};
use places_bot::bot::transport::MemberRole;
use places_bot::database::models::{Place, Rating};

#[tokio::test]
async fn test_add_place_then_duplicate_is_rejected() -> Result<()> {
    let bot = TestBot::new().await?;

    assert!(bot.controller.begin_add(&bot.message(MEMBER, "/add")).await.is_none());
    assert_eq!(bot.transport.last_text(), "✏️ Enter the name of the place:");

    assert!(bot.controller.handle_text(&bot.message(MEMBER, "Cafe X")).await.is_none());
    assert_eq!(bot.transport.last_text(), "✏️ Enter the address of 'cafe x':");
    assert_eq!(
        bot.controller.state_of(CHAT, MEMBER).await,
        DialogueState::AddPlace(AddStep::AwaitingAddress { name: "cafe x".to_string() })
    );

    let request = bot.controller.handle_text(&bot.message(MEMBER, "Main St")).await;
    assert!(request.is_some());
    assert_eq!(bot.transport.last_text(), "✅ Place 'cafe x' added!");
    assert!(bot.controller.state_of(CHAT, MEMBER).await.is_idle());

    // Second attempt with a different spelling and address.
    bot.controller.begin_add(&bot.message(MEMBER, "/add")).await;
    let request = bot.controller.handle_text(&bot.message(MEMBER, "cafe x")).await;
    assert!(request.is_some());
    assert_eq!(bot.transport.last_text(), "❌ 'cafe x' is already on the list!");
    assert!(bot.controller.state_of(CHAT, MEMBER).await.is_idle());

    assert_eq!(Place::count(&bot.db.pool).await?, 1);
    let place = Place::find(&bot.db.pool, "cafe x").await?.unwrap();
    assert_eq!(place.address, "Main St");

    Ok(())
}

#[tokio::test]
async fn test_add_flow_cleanup_covers_every_message_in_order() -> Result<()> {
    let bot = TestBot::new().await?;

    let command = bot.message(MEMBER, "/add");
    let name = bot.message(MEMBER, "Bar Y");
    let address = bot.message(MEMBER, "2 Side Rd");

    bot.controller.begin_add(&command).await;
    bot.controller.handle_text(&name).await;
    let request = bot.controller.handle_text(&address).await.unwrap();

    let bot_ids = bot.transport.sent_ids();
    assert_eq!(bot_ids.len(), 3);
    assert_eq!(request.chat_id, CHAT);
    assert_eq!(request.delay, Duration::from_secs(1));
    assert_eq!(
        request.message_ids,
        vec![
            command.message_id,
            bot_ids[0],
            name.message_id,
            bot_ids[1],
            address.message_id,
            bot_ids[2],
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_add_reprompts_on_invalid_name() -> Result<()> {
    let bot = TestBot::new().await?;

    bot.controller.begin_add(&bot.message(MEMBER, "/add")).await;
    assert!(bot.controller.handle_text(&bot.message(MEMBER, "   ")).await.is_none());

    assert_eq!(
        bot.transport.last_text(),
        "⚠️ Place name cannot be empty. Enter the name of the place:"
    );
    assert_eq!(bot.controller.state_of(CHAT, MEMBER).await, DialogueState::start_add());

    Ok(())
}

#[tokio::test]
async fn test_add_refused_outside_allowed_chats() -> Result<()> {
    let settings = FlowSettings {
        allowed_chat_ids: vec![ChatId(42)],
        ..FlowSettings::default()
    };
    let bot = TestBot::with_settings(settings).await?;

    let request = bot.controller.begin_add(&bot.message(MEMBER, "/add")).await;

    assert!(request.is_some());
    assert_eq!(bot.transport.last_text(), "❌ Adding places is not enabled in this chat.");
    assert!(bot.controller.state_of(CHAT, MEMBER).await.is_idle());

    Ok(())
}

#[tokio::test]
async fn test_rating_twice_averages_scores() -> Result<()> {
    let bot = TestBot::new().await?;
    Place::insert(&bot.db.pool, "cafe x", "Main St").await?;

    bot.controller.begin_rate(&bot.message(MEMBER, "/rating")).await;
    bot.controller.handle_text(&bot.message(MEMBER, "Cafe X")).await;
    assert_eq!(bot.transport.last_text(), "✏️ Rate 'cafe x' from 1 to 10:");
    bot.controller.handle_text(&bot.message(MEMBER, "5")).await;
    assert_eq!(bot.transport.last_text(), "✅ Rating saved! 'cafe x' now averages 5.0.");

    bot.controller.begin_rate(&bot.message(ADMIN, "/rating")).await;
    bot.controller.handle_text(&bot.message(ADMIN, "cafe x")).await;
    let request = bot.controller.handle_text(&bot.message(ADMIN, "9")).await;
    assert!(request.is_some());
    assert_eq!(bot.transport.last_text(), "✅ Rating saved! 'cafe x' now averages 7.0.");

    let place = Place::find(&bot.db.pool, "cafe x").await?.unwrap();
    assert_eq!(place.rating, 7.0);
    assert_eq!(Rating::find_by_place(&bot.db.pool, "cafe x").await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_rating_unknown_place_exhausts_after_two_attempts() -> Result<()> {
    let bot = TestBot::new().await?;

    bot.controller.begin_rate(&bot.message(MEMBER, "/rating")).await;

    assert!(bot.controller.handle_text(&bot.message(MEMBER, "nowhere")).await.is_none());
    assert_eq!(
        bot.transport.last_text(),
        "⚠️ There is no place called 'nowhere'.\n\nAttempts left: 1"
    );
    assert_eq!(
        bot.controller.state_of(CHAT, MEMBER).await,
        DialogueState::RatePlace(RateStep::AwaitingName { attempts_left: 1 })
    );

    let request = bot.controller.handle_text(&bot.message(MEMBER, "nowhere")).await;
    assert!(request.is_some());
    assert!(bot.transport.last_text().ends_with("No attempts left, the operation is cancelled."));
    assert!(bot.controller.state_of(CHAT, MEMBER).await.is_idle());

    Ok(())
}

#[tokio::test]
async fn test_rating_invalid_scores_cancel_without_recording() -> Result<()> {
    let bot = TestBot::new().await?;
    Place::insert(&bot.db.pool, "park", "Green Ave").await?;

    bot.controller.begin_rate(&bot.message(MEMBER, "/rating")).await;
    bot.controller.handle_text(&bot.message(MEMBER, "park")).await;

    bot.controller.handle_text(&bot.message(MEMBER, "eleven")).await;
    assert_eq!(
        bot.transport.last_text(),
        "⚠️ 'eleven' is not a whole number. Send a whole number from 1 to 10.\n\nAttempts left: 1"
    );
    assert_eq!(
        bot.controller.state_of(CHAT, MEMBER).await,
        DialogueState::RatePlace(RateStep::AwaitingScore {
            name: "park".to_string(),
            attempts_left: 1
        })
    );

    let request = bot.controller.handle_text(&bot.message(MEMBER, "0")).await;
    assert!(request.is_some());
    assert!(bot.transport.last_text().starts_with("❌ Score must be between 1 and 10."));
    assert!(bot.controller.state_of(CHAT, MEMBER).await.is_idle());

    assert!(Rating::find_by_place(&bot.db.pool, "park").await?.is_empty());
    assert_eq!(Place::find(&bot.db.pool, "park").await?.unwrap().rating, 0.0);

    Ok(())
}

#[tokio::test]
async fn test_rating_place_deleted_mid_flow() -> Result<()> {
    let bot = TestBot::new().await?;
    Place::insert(&bot.db.pool, "museum", "Old Sq").await?;

    bot.controller.begin_rate(&bot.message(MEMBER, "/rating")).await;
    bot.controller.handle_text(&bot.message(MEMBER, "museum")).await;
    Place::delete(&bot.db.pool, "museum").await?;

    let request = bot.controller.handle_text(&bot.message(MEMBER, "8")).await;
    assert!(request.is_some());
    assert_eq!(bot.transport.last_text(), "❌ 'museum' is no longer on the list.");
    assert!(Rating::find_by_place(&bot.db.pool, "museum").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_delete_unknown_place_three_times_cancels() -> Result<()> {
    let bot = TestBot::new().await?;

    bot.controller.begin_delete(&bot.message(ADMIN, "/del")).await;
    assert_eq!(bot.transport.last_text(), "✏️ Enter the name of the place to delete:");
    assert_eq!(bot.controller.state_of(CHAT, ADMIN).await, DialogueState::start_delete());

    assert!(bot.controller.handle_text(&bot.message(ADMIN, "nonexistent")).await.is_none());
    assert!(bot.transport.last_text().ends_with("Attempts left: 2"));

    assert!(bot.controller.handle_text(&bot.message(ADMIN, "nonexistent")).await.is_none());
    assert_eq!(
        bot.controller.state_of(CHAT, ADMIN).await,
        DialogueState::DeletePlace { attempts_left: 1 }
    );

    let request = bot.controller.handle_text(&bot.message(ADMIN, "nonexistent")).await;
    assert!(request.is_some());
    assert_eq!(
        bot.transport.last_text(),
        "❌ There is no place called 'nonexistent'.\n\nNo attempts left, the operation is cancelled."
    );
    assert!(bot.controller.state_of(CHAT, ADMIN).await.is_idle());

    Ok(())
}

#[tokio::test]
async fn test_delete_removes_place_case_insensitively() -> Result<()> {
    let bot = TestBot::new().await?;
    Place::insert(&bot.db.pool, "cafe x", "Main St").await?;

    bot.controller.begin_delete(&bot.message(ADMIN, "/del")).await;
    let request = bot.controller.handle_text(&bot.message(ADMIN, "  CAFE X ")).await;

    assert!(request.is_some());
    assert_eq!(bot.transport.last_text(), "✅ Place 'cafe x' deleted!");
    assert!(!Place::exists(&bot.db.pool, "cafe x").await?);

    Ok(())
}

#[tokio::test]
async fn test_non_admin_delete_is_refused_immediately() -> Result<()> {
    let bot = TestBot::new().await?;
    let command = bot.message(MEMBER, "/del");

    let request = bot.controller.begin_delete(&command).await.unwrap();

    assert_eq!(
        bot.transport.last_text(),
        "❌ You are not an administrator of this chat and have no permission to delete places!"
    );
    assert!(bot.controller.state_of(CHAT, MEMBER).await.is_idle());
    assert_eq!(request.delay, Duration::from_secs(10));
    assert_eq!(request.message_ids, vec![command.message_id, bot.transport.sent_ids()[0]]);

    Ok(())
}

#[tokio::test]
async fn test_chat_administrator_may_delete() -> Result<()> {
    let bot = TestBot::new().await?;
    let moderator = UserId(3);
    bot.transport.set_role(CHAT, moderator, MemberRole::Administrator);

    assert!(bot.controller.begin_delete(&bot.message(moderator, "/del")).await.is_none());
    assert_eq!(bot.controller.state_of(CHAT, moderator).await, DialogueState::start_delete());

    Ok(())
}

#[tokio::test]
async fn test_failed_role_lookup_counts_as_unauthorized() -> Result<()> {
    let bot = TestBot::new().await?;
    let moderator = UserId(3);
    bot.transport.set_role(CHAT, moderator, MemberRole::Owner);
    bot.transport.fail_role_lookups(true);

    assert!(bot.controller.begin_delete(&bot.message(moderator, "/del")).await.is_some());
    assert!(bot.transport.last_text().contains("no permission to delete places"));

    // Allow-listed users never need the lookup.
    assert!(bot.controller.begin_delete(&bot.message(ADMIN, "/del")).await.is_none());

    Ok(())
}

#[tokio::test]
async fn test_demoted_user_cannot_finish_delete() -> Result<()> {
    let bot = TestBot::new().await?;
    Place::insert(&bot.db.pool, "park", "Green Ave").await?;
    let moderator = UserId(3);
    bot.transport.set_role(CHAT, moderator, MemberRole::Administrator);

    bot.controller.begin_delete(&bot.message(moderator, "/del")).await;
    bot.transport.set_role(CHAT, moderator, MemberRole::Member);

    let request = bot.controller.handle_text(&bot.message(moderator, "park")).await.unwrap();

    assert_eq!(request.delay, Duration::from_secs(10));
    assert!(Place::exists(&bot.db.pool, "park").await?);
    assert!(bot.controller.state_of(CHAT, moderator).await.is_idle());

    Ok(())
}

#[tokio::test]
async fn test_cancel_inside_and_outside_a_flow() -> Result<()> {
    let bot = TestBot::new().await?;

    let request = bot.controller.cancel(&bot.message(MEMBER, "/cancel")).await;
    assert!(request.is_some());
    assert_eq!(bot.transport.last_text(), "ℹ️ Nothing to cancel.");

    let command = bot.message(MEMBER, "/add");
    bot.controller.begin_add(&command).await;
    let cancel = bot.message(MEMBER, "/cancel");
    let request = bot.controller.cancel(&cancel).await.unwrap();

    assert_eq!(bot.transport.last_text(), "ℹ️ Cancelled.");
    assert!(bot.controller.state_of(CHAT, MEMBER).await.is_idle());
    assert_eq!(request.message_ids.len(), 4);
    assert_eq!(request.message_ids[0], command.message_id);
    assert_eq!(request.message_ids[2], cancel.message_id);

    Ok(())
}

#[tokio::test]
async fn test_idle_text_is_ignored() -> Result<()> {
    let bot = TestBot::new().await?;

    assert!(bot.controller.handle_text(&bot.message(MEMBER, "hello")).await.is_none());
    assert!(bot.transport.texts().is_empty());
    assert_eq!(bot.controller.sessions().active_sessions(), 0);

    Ok(())
}

#[tokio::test]
async fn test_new_flow_replaces_open_flow() -> Result<()> {
    let bot = TestBot::new().await?;
    Place::insert(&bot.db.pool, "park", "Green Ave").await?;

    let add = bot.message(MEMBER, "/add");
    bot.controller.begin_add(&add).await;
    bot.controller.begin_rate(&bot.message(MEMBER, "/rating")).await;
    assert_eq!(bot.controller.state_of(CHAT, MEMBER).await, DialogueState::start_rate());

    bot.controller.handle_text(&bot.message(MEMBER, "park")).await;
    let request = bot.controller.handle_text(&bot.message(MEMBER, "7")).await.unwrap();

    // Messages of the abandoned add flow are cleaned up with the rating flow.
    assert_eq!(request.message_ids[0], add.message_id);
    assert_eq!(request.message_ids.len(), 8);
    assert_eq!(Place::count(&bot.db.pool).await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_abandon_returns_pending_messages() -> Result<()> {
    let bot = TestBot::new().await?;

    assert!(bot.controller.abandon(&bot.message(MEMBER, "/place")).await.is_none());

    let add = bot.message(MEMBER, "/add");
    bot.controller.begin_add(&add).await;
    let request = bot.controller.abandon(&bot.message(MEMBER, "/place")).await.unwrap();

    assert_eq!(request.message_ids, vec![add.message_id, bot.transport.sent_ids()[0]]);
    assert!(bot.controller.state_of(CHAT, MEMBER).await.is_idle());
    assert_eq!(bot.controller.sessions().active_sessions(), 0);

    Ok(())
}

#[tokio::test]
async fn test_users_have_independent_sessions() -> Result<()> {
    let bot = TestBot::new().await?;

    bot.controller.begin_add(&bot.message(MEMBER, "/add")).await;
    bot.controller.begin_delete(&bot.message(ADMIN, "/del")).await;

    bot.controller.handle_text(&bot.message(MEMBER, "Zoo")).await;

    assert_eq!(
        bot.controller.state_of(CHAT, MEMBER).await,
        DialogueState::AddPlace(AddStep::AwaitingAddress { name: "zoo".to_string() })
    );
    assert_eq!(bot.controller.state_of(CHAT, ADMIN).await, DialogueState::start_delete());
    assert_eq!(bot.controller.sessions().active_sessions(), 2);

    Ok(())
}

#[tokio::test]
async fn test_transport_failure_ends_flow() -> Result<()> {
    let bot = TestBot::new().await?;

    let add = bot.message(MEMBER, "/add");
    bot.controller.begin_add(&add).await;
    bot.transport.fail_sends(true);

    let name = bot.message(MEMBER, "Library");
    let request = bot.controller.handle_text(&name).await.unwrap();

    assert!(bot.controller.state_of(CHAT, MEMBER).await.is_idle());
    assert_eq!(
        request.message_ids,
        vec![add.message_id, bot.transport.sent_ids()[0], name.message_id]
    );

    Ok(())
}

#[tokio::test]
async fn test_store_failure_ends_flow_with_generic_reply() -> Result<()> {
    let bot = TestBot::new().await?;

    let add = bot.message(MEMBER, "/add");
    bot.controller.begin_add(&add).await;
    bot.db.pool.close().await;

    let name = bot.message(MEMBER, "Cafe");
    let request = bot.controller.handle_text(&name).await.unwrap();

    assert_eq!(
        bot.transport.last_text(),
        "❌ Something went wrong, please try again later."
    );
    assert!(bot.controller.state_of(CHAT, MEMBER).await.is_idle());
    assert_eq!(request.delay, bot.controller.settings().cleanup_delay);
    assert_eq!(request.message_ids.len(), 4);
    assert!(request.message_ids.contains(&name.message_id));

    Ok(())
}
