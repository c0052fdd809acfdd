//! End-to-end reconciliation over real HTTP: an in-process server backed by
//! in-memory storage, driven by two independent devices.

use std::sync::Arc;

use uuid::Uuid;

use vaultd::client::api::{ClientConfig, SyncClient};
use vaultd::client::credentials::MemoryCredentials;
use vaultd::client::vault::LocalCache;
use vaultd::config::Config;
use vaultd::error::AppError;
use vaultd::models::envelope::Envelope;
use vaultd::models::item::{BankCard, Item, Login};
use vaultd::router::build_router;
use vaultd::state::AppState;
use vaultd::storage::MemoryStorage;

struct TestServer {
    base_url: String,
    state: AppState,
}

async fn spawn_server() -> TestServer {
    let state = AppState::with_storage(Config::default(), Arc::new(MemoryStorage::new()));
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        state,
    }
}

fn device(base_url: &str) -> SyncClient {
    let vault = Arc::new(LocalCache::new(Arc::new(MemoryCredentials::new())));
    SyncClient::new(
        ClientConfig {
            server_url: base_url.to_string(),
            request_timeout_secs: 5,
        },
        vault,
    )
    .unwrap()
}

fn sample_login() -> Item {
    Item::Login(Login {
        username: "a".to_string(),
        password: "b".to_string(),
        ..Default::default()
    })
}

#[tokio::test]
async fn two_devices_converge_on_one_round_trip() {
    let server = spawn_server().await;
    let email = "alice@example.com";

    // Device A registers, stores one login, syncs.
    let device_a = device(&server.base_url);
    device_a.sign_up(email, "p-master-1").await.unwrap();
    let envelope = device_a
        .vault()
        .add_encrypted(&sample_login(), "site1", None)
        .unwrap();
    device_a.sync().await.unwrap();

    // Device B, same owner, empty local cache: a pure pull must return
    // exactly that envelope, decryptable with the shared passphrase.
    let device_b = device(&server.base_url);
    device_b.sign_in(email, "p-master-1").await.unwrap();
    assert!(device_b.vault().is_empty());
    device_b.sync().await.unwrap();

    let snapshot = device_b.vault().snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, envelope.id);
    assert_eq!(snapshot[0].name, "site1");

    let (item, _) = device_b.vault().find_decrypt(envelope.id).unwrap();
    assert_eq!(item, sample_login());
}

#[tokio::test]
async fn tombstones_propagate_to_other_devices() {
    let server = spawn_server().await;
    let email = "bob@example.com";

    let device_a = device(&server.base_url);
    device_a.sign_up(email, "p-master-2").await.unwrap();
    let envelope = device_a
        .vault()
        .add_encrypted(&sample_login(), "doomed", None)
        .unwrap();
    device_a.sync().await.unwrap();

    let device_b = device(&server.base_url);
    device_b.sign_in(email, "p-master-2").await.unwrap();
    device_b.sync().await.unwrap();
    assert!(device_b.vault().find_decrypt(envelope.id).is_ok());

    // A deletes and syncs; B's next round trip surfaces the tombstone.
    device_a.vault().delete(envelope.id).unwrap();
    device_a.sync().await.unwrap();
    device_b.sync().await.unwrap();

    assert!(matches!(
        device_b.vault().find_decrypt(envelope.id),
        Err(AppError::Deleted)
    ));
    let tomb = device_b
        .vault()
        .snapshot()
        .into_iter()
        .find(|e| e.id == envelope.id)
        .unwrap();
    assert!(tomb.deleted_at > 0);
    assert!(tomb.data.is_empty());
}

#[tokio::test]
async fn concurrent_edits_resolve_last_write_wins() {
    let server = spawn_server().await;
    let email = "carol@example.com";

    let device_a = device(&server.base_url);
    device_a.sign_up(email, "p-master-3").await.unwrap();
    let envelope = device_a
        .vault()
        .add_encrypted(&sample_login(), "shared", None)
        .unwrap();
    device_a.sync().await.unwrap();

    let device_b = device(&server.base_url);
    device_b.sign_in(email, "p-master-3").await.unwrap();
    device_b.sync().await.unwrap();

    // Both devices edit the same envelope; B edits after A.
    let renamed_a = Item::Login(Login {
        username: "from-a".to_string(),
        ..Default::default()
    });
    let renamed_b = Item::Login(Login {
        username: "from-b".to_string(),
        ..Default::default()
    });
    device_a
        .vault()
        .add_encrypted(&renamed_a, "shared", Some(envelope.id))
        .unwrap();
    device_a.sync().await.unwrap();
    // timestamps are unix seconds; edit twice so B's final stamp sits
    // strictly past anything A produced within the same second
    device_b
        .vault()
        .add_encrypted(&renamed_b, "shared", Some(envelope.id))
        .unwrap();
    device_b
        .vault()
        .add_encrypted(&renamed_b, "shared", Some(envelope.id))
        .unwrap();
    device_b.sync().await.unwrap();
    device_a.sync().await.unwrap();

    // B's later timestamp won on both devices.
    let (item_a, _) = device_a.vault().find_decrypt(envelope.id).unwrap();
    let (item_b, _) = device_b.vault().find_decrypt(envelope.id).unwrap();
    assert_eq!(item_a, renamed_b);
    assert_eq!(item_b, renamed_b);
}

#[tokio::test]
async fn foreign_envelopes_never_reach_the_victim() {
    let server = spawn_server().await;

    let victim = device(&server.base_url);
    victim.sign_up("victim@example.com", "p-victim").await.unwrap();
    victim
        .vault()
        .add_encrypted(&sample_login(), "mine", None)
        .unwrap();
    victim.sync().await.unwrap();
    let victim_id = victim.vault().identity().unwrap().user_id;

    // The attacker forges an envelope claiming the victim's owner id and
    // submits it next to a legitimate one of their own.
    let attacker = device(&server.base_url);
    attacker
        .sign_up("attacker@example.com", "p-attacker")
        .await
        .unwrap();
    let own = attacker
        .vault()
        .add_encrypted(&sample_login(), "own", None)
        .unwrap();
    let forged = Envelope {
        id: Uuid::new_v4(),
        owner_id: victim_id,
        kind: vaultd::models::item::ItemKind::ArbitraryText,
        name: "planted".to_string(),
        created_at: 1,
        updated_at: i64::MAX,
        deleted_at: 0,
        data: vec![0xde, 0xad],
    };
    attacker.vault().swap(vec![own.clone(), forged.clone()]);
    attacker.sync().await.unwrap();

    // Dropped for the attacker, invisible to the victim.
    let attacker_set = attacker.vault().snapshot();
    assert_eq!(attacker_set.len(), 1);
    assert_eq!(attacker_set[0].id, own.id);
    victim.sync().await.unwrap();
    let victim_set = victim.vault().snapshot();
    assert_eq!(victim_set.len(), 1);
    assert_eq!(victim_set[0].name, "mine");
}

#[tokio::test]
async fn revoked_session_triggers_one_relogin_and_the_sync_succeeds() {
    let server = spawn_server().await;
    let email = "dave@example.com";

    let device_a = device(&server.base_url);
    device_a.sign_up(email, "p-master-4").await.unwrap();
    device_a
        .vault()
        .add_encrypted(&sample_login(), "site1", None)
        .unwrap();
    device_a.sync().await.unwrap();

    // Server-side revocation (logout-everywhere); the next sync gets 401,
    // re-authenticates from the stored passphrase and retries once.
    let user_id = device_a.vault().identity().unwrap().user_id;
    server.state.sessions.delete_all_sessions(user_id);

    device_a.sync().await.unwrap();
    assert_eq!(device_a.vault().len(), 1);
}

#[tokio::test]
async fn sync_without_a_session_is_unauthorized() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/sync", server.base_url))
        .body("[]")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn empty_body_is_a_pure_pull_and_empty_set_is_no_content() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    let register = client
        .post(format!("{}/api/auth/register", server.base_url))
        .json(&serde_json::json!({
            "email": "erin@example.com",
            "password": "p-master-5"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(register.status().as_u16(), 201);
    let session_cookie = register
        .cookies()
        .find(|c| c.name() == "session_id")
        .expect("session cookie missing")
        .value()
        .to_string();

    // No body at all, zero stored items: a valid pure pull, answered with
    // the distinguished no-content status rather than an error.
    let sync = client
        .post(format!("{}/api/sync", server.base_url))
        .header("Authorization", format!("Bearer {}", session_cookie))
        .send()
        .await
        .unwrap();
    assert_eq!(sync.status().as_u16(), 204);
}

#[tokio::test]
async fn transport_failure_leaves_the_local_cache_untouched() {
    // Reserve an ephemeral port, then close it so connections are refused.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let device = device(&format!("http://{}", addr));
    device
        .vault()
        .credentials()
        .set_passphrase("zoe@example.com", "p-master-7")
        .unwrap();
    device.vault().set_identity("zoe@example.com", Uuid::new_v4());
    device
        .vault()
        .add_encrypted(&sample_login(), "site1", None)
        .unwrap();
    let before = device.vault().snapshot();

    assert!(matches!(device.sync().await, Err(AppError::Transport(_))));
    assert_eq!(device.vault().snapshot(), before);
}

#[tokio::test]
async fn malformed_server_response_leaves_the_local_cache_untouched() {
    // A server that answers the sync route with a 200 and garbage.
    let app = axum::Router::new().route(
        "/api/sync",
        axum::routing::post(|| async { "certainly not json" }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let device = device(&format!("http://{}", addr));
    device
        .vault()
        .credentials()
        .set_passphrase("yan@example.com", "p-master-8")
        .unwrap();
    device.vault().set_identity("yan@example.com", Uuid::new_v4());
    device
        .vault()
        .add_encrypted(&sample_login(), "site1", None)
        .unwrap();
    let before = device.vault().snapshot();

    assert!(matches!(
        device.sync().await,
        Err(AppError::Serialization(_))
    ));
    assert_eq!(device.vault().snapshot(), before);
}

#[tokio::test]
async fn bank_cards_survive_the_round_trip() {
    let server = spawn_server().await;
    let email = "frank@example.com";

    let device_a = device(&server.base_url);
    device_a.sign_up(email, "p-master-6").await.unwrap();
    let card = Item::BankCard(BankCard {
        info: "travel".to_string(),
        card_type: "visa".to_string(),
        card_num: "4111111111111111".to_string(),
        card_name: "FRANK EXAMPLE".to_string(),
        card_cvv: "321".to_string(),
        card_exp: "01/30".to_string(),
    });
    let envelope = device_a
        .vault()
        .add_encrypted(&card, "travel card", None)
        .unwrap();
    device_a.sync().await.unwrap();

    let device_b = device(&server.base_url);
    device_b.sign_in(email, "p-master-6").await.unwrap();
    device_b.sync().await.unwrap();
    let (item, _) = device_b.vault().find_decrypt(envelope.id).unwrap();
    assert_eq!(item, card);
}
