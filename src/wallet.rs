//! Wallet provider and account-change notifications
//!
//! The wallet owns the keys. This side only asks it for accounts and hands it
//! unsigned transactions over its JSON-RPC interface.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::abi::{Address, Call};
use crate::error::{RpcError, WalletError};
use crate::rpc::JsonRpcClient;

/// Unsigned transaction handed to the wallet for signing and broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    pub from: String,
    pub to: String,
    pub data: String,
}

impl TransactionRequest {
    pub fn contract_call(from: &Address, contract: &Address, call: &Call) -> Self {
        Self {
            from: from.to_lower_hex(),
            to: contract.to_lower_hex(),
            data: call.to_hex(),
        }
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Asks the user to expose accounts. Refusal is `WalletError::Refused`.
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Currently exposed accounts, without prompting.
    async fn accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Signs and broadcasts; returns the transaction hash.
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String, RpcError>;
}

/// Wallet reached through its JSON-RPC endpoint
#[derive(Debug, Clone)]
pub struct RpcWallet {
    client: JsonRpcClient,
}

impl RpcWallet {
    pub fn new(client: JsonRpcClient) -> Self {
        Self { client }
    }

    async fn fetch_accounts(&self, method: &str) -> Result<Vec<Address>, WalletError> {
        match self.client.request(method, json!([])).await {
            Ok(v) => parse_accounts(&v),
            Err(e) if e.is_user_rejection() => Err(WalletError::Refused),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    #[instrument(skip(self))]
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        let accounts = self.fetch_accounts("eth_requestAccounts").await?;
        if accounts.is_empty() {
            return Err(WalletError::NoAccounts);
        }
        Ok(accounts)
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.fetch_accounts("eth_accounts").await
    }

    #[instrument(skip(self), fields(to = %tx.to))]
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String, RpcError> {
        self.client.call("eth_sendTransaction", json!([tx])).await
    }
}

/// Notifications a wallet can raise while a session is open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
}

/// Polls the wallet's account list and publishes a [`WalletEvent`] whenever it
/// changes.
pub struct AccountWatcher {
    handle: JoinHandle<()>,
}

impl AccountWatcher {
    /// Starts polling. `initial` is the list the session already knows, so the
    /// first event is only raised on an actual change.
    pub fn spawn<W>(
        wallet: W,
        initial: Vec<Address>,
        interval: Duration,
    ) -> (Self, mpsc::Receiver<WalletEvent>)
    where
        W: WalletProvider + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(async move {
            let mut known = initial;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match wallet.accounts().await {
                    Ok(current) if current != known => {
                        info!(count = current.len(), "wallet accounts changed");
                        known = current.clone();
                        if tx.send(WalletEvent::AccountsChanged(current)).await.is_err() {
                            debug!("event receiver dropped, stopping account watcher");
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "failed to poll wallet accounts"),
                }
            }
        });
        (Self { handle }, rx)
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for AccountWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Account list a watcher starts from. The session's account is
/// authoritative; a poll result is used only when it agrees with it, so a
/// failed or stale poll never raises a change for the account already in use.
pub fn watch_seed(session: Option<&Address>, polled: Option<Vec<Address>>) -> Vec<Address> {
    match polled {
        Some(accounts) if accounts.first() == session => accounts,
        _ => session.copied().into_iter().collect(),
    }
}

/// Maps an `eth_accounts`-style payload to addresses.
pub fn parse_accounts(value: &Value) -> Result<Vec<Address>, WalletError> {
    let raw: Vec<String> = serde_json::from_value(value.clone()).map_err(RpcError::from)?;
    raw.iter()
        .map(|a| Address::parse(a).map_err(WalletError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ALICE: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
    const BOB: &str = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";

    fn wallet(server: &MockServer) -> RpcWallet {
        RpcWallet::new(JsonRpcClient::new(&server.uri(), Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn test_request_accounts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_requestAccounts"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": [ALICE]
            })))
            .mount(&server)
            .await;

        let accounts = wallet(&server).request_accounts().await.unwrap();
        assert_eq!(accounts, vec![Address::parse(ALICE).unwrap()]);
    }

    #[tokio::test]
    async fn test_refusal_maps_to_refused() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "error": {"code": 4001, "message": "User rejected the request."}
            })))
            .mount(&server)
            .await;

        let err = wallet(&server).request_accounts().await.unwrap_err();
        assert!(matches!(err, WalletError::Refused));
    }

    #[tokio::test]
    async fn test_empty_account_list_on_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": []
            })))
            .mount(&server)
            .await;

        let err = wallet(&server).request_accounts().await.unwrap_err();
        assert!(matches!(err, WalletError::NoAccounts));
    }

    #[test]
    fn test_transaction_request_shape() {
        let from = Address::parse(ALICE).unwrap();
        let to = Address::parse(BOB).unwrap();
        let call = crate::abi::add_admin(&from);
        let tx = TransactionRequest::contract_call(&from, &to, &call);
        let v = serde_json::to_value(&tx).unwrap();
        assert_eq!(v["from"], ALICE);
        assert_eq!(v["to"], BOB);
        assert!(v["data"].as_str().unwrap().starts_with("0x"));
    }

    struct ScriptedWallet {
        script: Arc<Mutex<Vec<Vec<Address>>>>,
    }

    #[async_trait]
    impl WalletProvider for ScriptedWallet {
        async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
            self.accounts().await
        }

        async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                Ok(script.remove(0))
            } else {
                Ok(script[0].clone())
            }
        }

        async fn send_transaction(&self, _tx: &TransactionRequest) -> Result<String, RpcError> {
            Err(RpcError::EmptyResponse)
        }
    }

    #[tokio::test]
    async fn test_watcher_emits_only_on_change() {
        let alice = Address::parse(ALICE).unwrap();
        let bob = Address::parse(BOB).unwrap();
        let wallet = ScriptedWallet {
            script: Arc::new(Mutex::new(vec![
                vec![alice],
                vec![alice],
                vec![bob],
                vec![],
            ])),
        };

        let (watcher, mut rx) =
            AccountWatcher::spawn(wallet, vec![alice], Duration::from_millis(5));

        assert_eq!(rx.recv().await, Some(WalletEvent::AccountsChanged(vec![bob])));
        assert_eq!(rx.recv().await, Some(WalletEvent::AccountsChanged(vec![])));
        watcher.stop();
    }

    #[test]
    fn test_watch_seed_follows_session() {
        let alice = Address::parse(ALICE).unwrap();
        let bob = Address::parse(BOB).unwrap();

        assert_eq!(watch_seed(Some(&alice), None), vec![alice]);
        assert_eq!(watch_seed(Some(&alice), Some(vec![alice, bob])), vec![alice, bob]);
        assert_eq!(watch_seed(Some(&alice), Some(vec![bob])), vec![alice]);
        assert_eq!(watch_seed(Some(&alice), Some(vec![])), vec![alice]);
        assert_eq!(watch_seed(None, Some(vec![])), Vec::<Address>::new());
        assert_eq!(watch_seed(None, None), Vec::<Address>::new());
    }

    #[tokio::test]
    async fn test_watcher_seeded_from_session_stays_quiet() {
        let alice = Address::parse(ALICE).unwrap();
        let wallet = ScriptedWallet {
            script: Arc::new(Mutex::new(vec![vec![alice]])),
        };

        let seed = watch_seed(Some(&alice), None);
        let (watcher, mut rx) = AccountWatcher::spawn(wallet, seed, Duration::from_millis(5));

        let quiet = tokio::time::timeout(Duration::from_millis(60), rx.recv()).await;
        assert!(quiet.is_err(), "unexpected event: {:?}", quiet);
        watcher.stop();
    }

    #[test]
    fn test_parse_accounts_payload() {
        let parsed = parse_accounts(&json!([ALICE, BOB])).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parse_accounts(&json!(["0x12"])).is_err());
    }
}
