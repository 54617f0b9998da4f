//! HTTP接口测试：使用内存存储和固定词表启动真实路由。

use hangman_server::config::CorsConfig;
use hangman_server::message::ErrorBody;
use hangman_server::{GameService, GameStore, GameSummary, HttpServer, WordSource};
use reqwest::StatusCode;
use std::sync::Arc;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
}

impl TestServer {
    async fn start(word: &str, legacy_status_labels: bool) -> Self {
        let service = Arc::new(GameService::new(
            GameStore::memory(),
            WordSource::from_words([word]).expect("word list"),
            legacy_status_labels,
        ));
        let app = HttpServer::new(service).router(&CorsConfig::default());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind failed");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server failed");
        });

        TestServer {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
        }
    }

    async fn start_game(&self) -> GameSummary {
        let response = self
            .client
            .post(format!("{}/games", self.base_url))
            .send()
            .await
            .expect("request failed");
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.expect("invalid json")
    }

    async fn get_game(&self, id: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/games/{}", self.base_url, id))
            .send()
            .await
            .expect("request failed")
    }

    async fn guess(&self, id: &str, character: Option<&str>) -> reqwest::Response {
        let mut request = self.client.post(format!("{}/games/{}", self.base_url, id));
        if let Some(character) = character {
            request = request.query(&[("char", character)]);
        }
        request.send().await.expect("request failed")
    }

    async fn guess_ok(&self, id: &str, character: &str) -> GameSummary {
        let response = self.guess(id, Some(character)).await;
        assert_eq!(response.status(), StatusCode::OK, "guess {}", character);
        response.json().await.expect("invalid json")
    }

    async fn summary(&self, id: &str) -> GameSummary {
        let response = self.get_game(id).await;
        assert_eq!(response.status(), StatusCode::OK);
        response.json().await.expect("invalid json")
    }
}

#[tokio::test]
async fn test_start_game_returns_masked_summary() {
    let server = TestServer::start("cat", true).await;
    let game = server.start_game().await;

    assert_eq!(game.id.len(), 32);
    assert!(game.id.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(game.tries_left, 11);
    assert_eq!(game.status, "busy");
    assert_eq!(game.word, "...");
    assert_eq!(server.summary(&game.id).await, game);
}

#[tokio::test]
async fn test_list_games() {
    let server = TestServer::start("cat", true).await;
    let response = server
        .client
        .get(format!("{}/games", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let games: Vec<GameSummary> = response.json().await.unwrap();
    assert!(games.is_empty());

    let first = server.start_game().await;
    let second = server.start_game().await;
    let games: Vec<GameSummary> = server
        .client
        .get(format!("{}/games", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(games.len(), 2);
    assert!(games.contains(&first));
    assert!(games.contains(&second));
}

#[tokio::test]
async fn test_unknown_and_malformed_ids_are_not_found() {
    let server = TestServer::start("cat", true).await;
    assert_eq!(
        server.get_game("0123456789abcdef").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(server.get_game("ABC").await.status(), StatusCode::NOT_FOUND);

    let response = server.guess("0123456789abcdef", Some("a")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = response.json().await.unwrap();
    assert!(!body.error.is_empty());
}

#[tokio::test]
async fn test_cat_scenario() {
    let server = TestServer::start("cat", true).await;
    let game = server.start_game().await;

    let after_a = server.guess_ok(&game.id, "a").await;
    assert_eq!(after_a.status, "busy");
    assert_eq!(after_a.word, ".a.");
    assert_eq!(after_a.tries_left, 11);

    let after_t = server.guess_ok(&game.id, "t").await;
    assert_eq!(after_t.word, ".at");
    assert_eq!(after_t.tries_left, 11);

    let after_c = server.guess_ok(&game.id, "c").await;
    assert_eq!(after_c.word, "cat");
    assert_eq!(after_c.status, "succes");
    assert_eq!(after_c.tries_left, 11);
}

#[tokio::test]
async fn test_dog_scenario_fails_after_eleven_misses() {
    let server = TestServer::start("dog", true).await;
    let game = server.start_game().await;

    let misses = ["q", "w", "x", "y", "z", "j", "k", "v", "b", "p", "m"];
    let mut last = None;
    for (i, c) in misses.iter().enumerate() {
        let summary = server.guess_ok(&game.id, c).await;
        assert_eq!(summary.tries_left, 10 - i as u32);
        last = Some(summary);
    }

    let last = last.unwrap();
    assert_eq!(last.tries_left, 0);
    assert_eq!(last.status, "fail");
    assert_eq!(last.word, "dog");

    let response = server.guess(&game.id, Some("d")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(server.summary(&game.id).await, last);
}

#[tokio::test]
async fn test_invalid_characters_are_rejected_without_changes() {
    let server = TestServer::start("cat", true).await;
    let game = server.start_game().await;

    for character in [Some("AB"), Some(""), Some("1"), Some("?"), None] {
        let response = server.guess(&game.id, character).await;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "char = {:?}",
            character
        );
    }
    assert_eq!(server.summary(&game.id).await, game);
}

#[tokio::test]
async fn test_uppercase_guess_is_lowercased() {
    let server = TestServer::start("cat", true).await;
    let game = server.start_game().await;

    let summary = server.guess_ok(&game.id, "A").await;
    assert_eq!(summary.word, ".a.");
}

#[tokio::test]
async fn test_repeated_guess_is_a_no_op() {
    let server = TestServer::start("cat", true).await;
    let game = server.start_game().await;

    let first = server.guess_ok(&game.id, "z").await;
    assert_eq!(first.tries_left, 10);
    let second = server.guess_ok(&game.id, "z").await;
    assert_eq!(second, first);
}

#[tokio::test]
async fn test_guess_after_success_is_forbidden() {
    let server = TestServer::start("cat", false).await;
    let game = server.start_game().await;
    for c in ["c", "a", "t"] {
        server.guess_ok(&game.id, c).await;
    }
    let finished = server.summary(&game.id).await;
    assert_eq!(finished.status, "success");

    let response = server.guess(&game.id, Some("x")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(server.summary(&game.id).await, finished);
}
