//! End-to-end integration tests
//!
//! These tests drive the complete request pipeline through `TradingService`
//! over a `JsonFileStore` in a temporary directory. Each test:
//! 1. Builds a service with a stub price oracle and a manually advanced clock
//! 2. Runs a user journey (signup, sign-in, dashboard, purchases)
//! 3. Checks both the outcomes and what was persisted to disk
//!
//! The session is carried between steps as a signed token, as the CLI does.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use rstest::rstest;
    use rust_decimal::Decimal;
    use rust_trading_ledger::core::traits::{CredentialStore, PriceOracle};
    use rust_trading_ledger::core::{EngineSettings, ManualClock, TransactionEngine};
    use rust_trading_ledger::io::{JsonFileStore, SessionCodec};
    use rust_trading_ledger::service::TradingService;
    use rust_trading_ledger::types::{
        Coin, Currency, HistoryRange, LedgerError, PricePoint, Prices, Session,
    };
    use std::fs;
    use std::str::FromStr;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct StubOracle {
        prices: Option<Prices>,
    }

    #[async_trait]
    impl PriceOracle for StubOracle {
        async fn current_prices(&self) -> Result<Prices, LedgerError> {
            self.prices
                .ok_or_else(|| LedgerError::price_fetch("stub oracle offline"))
        }

        async fn historical_prices(
            &self,
            _coin: Coin,
            _range: HistoryRange,
        ) -> Result<Vec<PricePoint>, LedgerError> {
            Err(LedgerError::price_fetch("stub oracle has no history"))
        }
    }

    struct Harness {
        _dir: TempDir,
        service: TradingService<JsonFileStore, StubOracle>,
        clock: ManualClock,
        store_path: std::path::PathBuf,
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn harness(prices: Option<Prices>) -> Harness {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store_path = dir.path().join("accounts.json");
        let store = JsonFileStore::open_or_create(&store_path).unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
        let engine = TransactionEngine::new(
            store,
            StubOracle { prices },
            EngineSettings {
                idle_timeout: Duration::from_secs(2),
                price_fetch_timeout: Duration::from_millis(200),
            },
            Arc::new(clock.clone()),
        );

        Harness {
            _dir: dir,
            service: TradingService::new(engine),
            clock,
            store_path,
        }
    }

    fn market() -> Option<Prices> {
        Some(Prices {
            btc: dec("6500"),
            eth: dec("250"),
        })
    }

    /// Sign up and sign in `alice`, then pin her USD balance on disk
    fn alice_with_usd(h: &Harness, usd: &str) -> Session {
        assert!(h.service.create_account("alice", "hunter22", true).unwrap().success);
        let mut session = Session::SignedOut;
        assert!(h
            .service
            .authenticate(&mut session, "alice", "hunter22")
            .unwrap()
            .success);

        let usd = dec(usd);
        h.service
            .engine()
            .store()
            .update("alice", |account| {
                account.balances.insert(Currency::Usd, usd);
                Ok(())
            })
            .unwrap();
        session
    }

    fn persisted_balance(h: &Harness, currency: Currency) -> Decimal {
        let store = JsonFileStore::open(&h.store_path).unwrap();
        store.get("alice").unwrap().unwrap().balance(currency)
    }

    #[test]
    fn test_signup_signin_dashboard_journey() {
        let h = harness(market());

        let created = h.service.create_account("alice", "hunter22", true).unwrap();
        assert!(created.success);

        let mut session = Session::SignedOut;
        let signed_in = h
            .service
            .authenticate(&mut session, "alice", "hunter22")
            .unwrap();
        assert!(signed_in.success);

        let first = h.service.view_dashboard(&mut session).unwrap();
        let view = first.value.expect("dashboard");
        let usd = view.dashboard.balances[&Currency::Usd];
        assert!(usd >= dec("8999") && usd <= dec("19999"));
        assert_eq!(usd.fract(), Decimal::ZERO);
        assert_eq!(view.dashboard.balances[&Currency::Btc], Decimal::ZERO);
        assert_eq!(view.dashboard.balances[&Currency::Eth], Decimal::ZERO);
        assert!(view.notice.unwrap().contains("has been funded!"));

        let second = h.service.view_dashboard(&mut session).unwrap();
        assert_eq!(second.value.unwrap().notice, None);

        // The one-time flag flip is on disk, not only in memory
        let raw = fs::read_to_string(&h.store_path).unwrap();
        assert!(raw.contains("\"is_new_account\": false"));
        assert!(!raw.contains("hunter22"));
    }

    #[rstest]
    #[case::space_in_username("alice bob", "hunter22", true, "Username must not contain spaces.")]
    #[case::empty_username("", "hunter22", true, "Username must not be empty.")]
    #[case::short_password("alice", "abc", true, "Password must be at least 4 characters.")]
    #[case::agreement_missing("alice", "hunter22", false, "You must accept the user agreement.")]
    fn test_signup_rejections(
        #[case] username: &str,
        #[case] password: &str,
        #[case] agreement: bool,
        #[case] expected: &str,
    ) {
        let h = harness(market());

        let outcome = h
            .service
            .create_account(username, password, agreement)
            .unwrap();

        assert!(!outcome.success);
        assert!(
            outcome.messages.iter().any(|m| m == expected),
            "missing {:?} in {:?}",
            expected,
            outcome.messages
        );
        assert!(h.service.engine().store().load().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_signup_keeps_original_account() {
        let h = harness(market());
        h.service.create_account("alice", "hunter22", true).unwrap();
        let before = fs::read_to_string(&h.store_path).unwrap();

        let outcome = h.service.create_account("alice", "other-pw", true).unwrap();

        assert_eq!(outcome.messages, vec!["Username is already taken.".to_string()]);
        assert_eq!(fs::read_to_string(&h.store_path).unwrap(), before);
        let mut session = Session::SignedOut;
        assert!(h
            .service
            .authenticate(&mut session, "alice", "hunter22")
            .unwrap()
            .success);
    }

    #[test]
    fn test_wrong_password_and_unknown_user_look_the_same() {
        let h = harness(market());
        h.service.create_account("alice", "hunter22", true).unwrap();
        let mut session = Session::SignedOut;

        let wrong = h.service.authenticate(&mut session, "alice", "nope").unwrap();
        let unknown = h.service.authenticate(&mut session, "bob", "hunter22").unwrap();

        assert_eq!(wrong, unknown);
        assert_eq!(wrong.message(), "Invalid credentials.");
        assert_eq!(session, Session::SignedOut);
    }

    #[tokio::test]
    async fn test_sequential_purchases_persist() {
        let h = harness(market());
        let mut session = alice_with_usd(&h, "10000");

        let first = h
            .service
            .purchase(&mut session, "btc", "650", "0.1")
            .await
            .unwrap();
        let second = h
            .service
            .purchase(&mut session, "BTC", "1300", "0.2")
            .await
            .unwrap();

        assert!(first.success && second.success);
        assert_eq!(persisted_balance(&h, Currency::Usd), dec("8050"));
        assert_eq!(persisted_balance(&h, Currency::Btc), dec("0.3"));

        let log = JsonFileStore::open(&h.store_path)
            .unwrap()
            .get("alice")
            .unwrap()
            .unwrap()
            .transactions;
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].usd_amount, dec("650"));
        assert_eq!(log[1].coin_amount, dec("0.2"));
    }

    #[rstest]
    #[case::insufficient_funds("eth", "150", "0.6", "Insufficient USD balance for this purchase.")]
    #[case::below_minimum("eth", "0.5", "0.002", "Minimum purchase of $1 is required.")]
    #[case::slippage(
        "btc",
        "50",
        "0.01",
        "The price has changed too much since your order was placed. Please try again."
    )]
    #[case::zero_coin_amount("btc", "50", "0", "Amounts must be valid, non-negative numbers.")]
    #[case::not_a_number("btc", "fifty", "0.01", "Invalid number for usd_amount: 'fifty'")]
    #[tokio::test]
    async fn test_rejected_purchase_changes_nothing(
        #[case] coin: &str,
        #[case] usd: &str,
        #[case] amount: &str,
        #[case] expected: &str,
    ) {
        let h = harness(market());
        let mut session = alice_with_usd(&h, "100");

        let outcome = h
            .service
            .purchase(&mut session, coin, usd, amount)
            .await
            .unwrap();

        assert!(!outcome.success);
        assert!(
            outcome.messages.iter().any(|m| m == expected),
            "missing {:?} in {:?}",
            expected,
            outcome.messages
        );
        assert_eq!(persisted_balance(&h, Currency::Usd), dec("100"));
        assert_eq!(persisted_balance(&h, Currency::Btc), Decimal::ZERO);
        assert_eq!(persisted_balance(&h, Currency::Eth), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_idle_session_expires() {
        let h = harness(market());
        let mut session = alice_with_usd(&h, "10000");

        h.clock.advance(ChronoDuration::seconds(3));
        let outcome = h
            .service
            .purchase(&mut session, "btc", "650", "0.1")
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(
            outcome.message(),
            "Your session has expired. Please sign in again."
        );
        assert_eq!(session, Session::SignedOut);
        assert_eq!(persisted_balance(&h, Currency::Usd), dec("10000"));
    }

    #[tokio::test]
    async fn test_offline_oracle_still_prices_orders() {
        let h = harness(None);

        let prices = h.service.current_prices().await;

        assert!(prices.btc >= dec("5000") && prices.btc <= dec("8000"));
        assert!(prices.eth >= dec("200") && prices.eth <= dec("300"));

        let history = h.service.price_history("btc", HistoryRange::Week).await;
        assert!(!history.unwrap().success);
    }

    #[test]
    fn test_session_survives_token_round_trip() {
        let h = harness(market());
        let session = alice_with_usd(&h, "100");
        let codec = SessionCodec::new("e2e-secret");

        let token = codec.encode(&session).unwrap();
        let mut restored = codec.decode(&token);

        assert_eq!(restored, session);
        assert!(h.service.view_dashboard(&mut restored).unwrap().success);

        let mut forged = SessionCodec::new("attacker").decode(&token);
        assert_eq!(forged, Session::SignedOut);
        assert!(!h.service.view_dashboard(&mut forged).unwrap().success);
    }

    #[test]
    fn test_corrupt_store_aborts_request() {
        let h = harness(market());
        fs::write(&h.store_path, "definitely not json").unwrap();

        let result = h.service.create_account("alice", "hunter22", true);

        assert!(matches!(result, Err(LedgerError::StorageUnavailable { .. })));
    }
}
