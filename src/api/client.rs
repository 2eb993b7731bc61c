use crate::error::{AppError, TransportError};
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use super::endpoints;
use super::models::*;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";
const RIOT_TIMEOUT: Duration = Duration::from_secs(12);
const THIRD_PARTY_TIMEOUT: Duration = Duration::from_secs(14);
const STATUS_BACKOFF: Duration = Duration::from_millis(350);
const NETWORK_BACKOFF: Duration = Duration::from_millis(250);
const TRANSIENT_STATUSES: [u16; 6] = [403, 429, 500, 502, 503, 504];

/// Fetches one URL and returns its parsed JSON body. `endpoint` is a short
/// label used in error reports and diagnostics.
pub trait JsonFetcher: Send + Sync {
    fn fetch_json(&self, url: &str, endpoint: &str) -> Result<Value, TransportError>;
}

/// Fetch `url` and deserialize it as `T`.
pub fn fetch_as<T: DeserializeOwned>(
    fetcher: &dyn JsonFetcher,
    url: &str,
    endpoint: &str,
) -> Result<T, AppError> {
    let value = fetcher.fetch_json(url, endpoint)?;
    serde_json::from_value(value).map_err(|e| AppError::json(endpoint, e))
}

pub struct HttpFetcher {
    agent: ureq::Agent,
    riot_token: String,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    clock: DefaultClock,
}

impl HttpFetcher {
    pub fn new(riot_token: &str) -> Self {
        // 20 requests per second towards Riot
        let quota = Quota::per_second(NonZeroU32::new(20).unwrap_or(NonZeroU32::MIN));
        HttpFetcher {
            agent: ureq::AgentBuilder::new().build(),
            riot_token: riot_token.to_string(),
            rate_limiter: RateLimiter::direct(quota),
            clock: DefaultClock::default(),
        }
    }

    fn wait_for_quota(&self) {
        while let Err(not_until) = self.rate_limiter.check() {
            thread::sleep(not_until.wait_time_from(self.clock.now()));
        }
    }

    fn request(&self, url: &str, riot: bool) -> ureq::Request {
        let request = self
            .agent
            .get(url)
            .timeout(if riot { RIOT_TIMEOUT } else { THIRD_PARTY_TIMEOUT })
            .set("Accept", "application/json")
            .set("User-Agent", USER_AGENT)
            .set("Accept-Language", "en-US,en;q=0.9");
        if riot {
            request.set("X-Riot-Token", &self.riot_token)
        } else {
            request
        }
    }
}

/// How one attempt failed, as far as the retry policy cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Status(u16),
    Network,
}

/// Backoff before the single permitted retry, or `None` to give up.
fn retry_after(failure: &Failure, retried: bool) -> Option<Duration> {
    if retried {
        return None;
    }
    match failure {
        Failure::Status(status) if TRANSIENT_STATUSES.contains(status) => Some(STATUS_BACKOFF),
        Failure::Status(_) => None,
        Failure::Network => Some(NETWORK_BACKOFF),
    }
}

impl JsonFetcher for HttpFetcher {
    fn fetch_json(&self, url: &str, endpoint: &str) -> Result<Value, TransportError> {
        let riot = endpoints::is_riot_host(url);
        let mut retried = false;

        loop {
            if riot {
                self.wait_for_quota();
            }
            debug!(endpoint, retried, "GET");

            match self.request(url, riot).call() {
                Ok(resp) => {
                    return resp.into_json::<Value>().map_err(|e| {
                        TransportError::new(502, endpoint, format!("invalid JSON body: {}", e))
                    });
                }
                Err(ureq::Error::Status(status, resp)) => {
                    if let Some(backoff) = retry_after(&Failure::Status(status), retried) {
                        warn!(endpoint, status, "transient status, retrying once");
                        thread::sleep(backoff);
                        retried = true;
                        continue;
                    }
                    let detail = resp.into_string().unwrap_or_default();
                    return Err(TransportError::new(status, endpoint, detail));
                }
                Err(ureq::Error::Transport(transport)) => {
                    if let Some(backoff) = retry_after(&Failure::Network, retried) {
                        warn!(endpoint, error = %transport, "network error, retrying once");
                        thread::sleep(backoff);
                        retried = true;
                        continue;
                    }
                    return Err(TransportError::new(502, endpoint, transport.to_string()));
                }
            }
        }
    }
}

/// Account, summoner and match lookups against Riot for one platform.
pub struct RiotApiClient {
    fetcher: Arc<dyn JsonFetcher>,
    platform: String,
    routing: &'static str,
}

impl RiotApiClient {
    pub fn new(fetcher: Arc<dyn JsonFetcher>, platform: &str) -> Result<Self, AppError> {
        let routing = endpoints::regional_routing(platform)
            .ok_or_else(|| AppError::UnsupportedPlatform(platform.to_string()))?;
        Ok(RiotApiClient {
            fetcher,
            platform: platform.to_string(),
            routing,
        })
    }

    pub fn get_account(&self, game_name: &str, tag_line: &str) -> Result<AccountDto, AppError> {
        let url = endpoints::account_by_riot_id(self.routing, game_name, tag_line);
        let account: AccountDto = fetch_as(self.fetcher.as_ref(), &url, "account_by_riot_id")
            .map_err(|e| match e {
                AppError::JsonError { .. } => {
                    AppError::PlayerNotFound(format!("{}#{}", game_name, tag_line))
                }
                AppError::Transport(t) if t.status == 404 => {
                    AppError::PlayerNotFound(format!("{}#{}", game_name, tag_line))
                }
                other => other,
            })?;

        if account.puuid.is_empty() {
            return Err(AppError::PlayerNotFound(format!("{}#{}", game_name, tag_line)));
        }
        Ok(account)
    }

    pub fn get_summoner(&self, puuid: &str) -> Result<SummonerDto, AppError> {
        let url = endpoints::summoner_by_puuid(&self.platform, puuid);
        fetch_as(self.fetcher.as_ref(), &url, "summoner_by_puuid")
    }

    pub fn get_match_ids(&self, puuid: &str, count: usize) -> Result<Vec<String>, AppError> {
        let url = endpoints::match_ids_by_puuid(self.routing, puuid, count);
        fetch_as(self.fetcher.as_ref(), &url, "match_ids")
    }

    pub fn get_match(&self, match_id: &str) -> Result<MatchDto, AppError> {
        let url = endpoints::match_detail(self.routing, match_id);
        fetch_as(self.fetcher.as_ref(), &url, "match_detail")
    }

    pub fn get_timeline(&self, match_id: &str) -> Result<TimelineDto, AppError> {
        let url = endpoints::match_timeline(self.routing, match_id);
        fetch_as(self.fetcher.as_ref(), &url, "match_timeline")
    }
}
