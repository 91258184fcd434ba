use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::html::{anchor_hrefs, first_table_rows, img_srcs};
use super::RecordSource;
use crate::config::ScraperSettings;
use crate::error::{PredictorError, PredictorResult};
use crate::types::{SessionRecord, WinTier};

const MIN_CELLS: usize = 5;
const SMALL_HIT_MARKER: &str = "小分";
const FREE_GAME_MARKER: &str = "免費";
const JACKPOT_MARKER: &str = "爆";

/// Replay links worth classifying contain both of these
const REPLAY_HOST: &str = "godeebxp.com/egames";
const REPLAY_GAME: &str = "egyptian-mythology";

/// Win tiers read from one result page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayPage {
    /// Result icons, by image source
    pub icons: Vec<(String, WinTier)>,
    /// Replay links for the tracked game
    pub links: Vec<(String, WinTier)>,
}

impl ReplayPage {
    pub fn parse(html: &str) -> Self {
        Self {
            icons: icon_tiers(html),
            links: replay_links(html),
        }
    }

    /// Highest tier shown anywhere on the page
    pub fn top_tier(&self) -> WinTier {
        self.icons
            .iter()
            .chain(self.links.iter())
            .map(|(_, tier)| *tier)
            .max()
            .unwrap_or(WinTier::NoBurst)
    }
}

/// Scraper for the public session table
#[derive(Debug, Clone)]
pub struct HaotingScraper {
    client: Client,
    url: String,
}

impl HaotingScraper {
    pub fn new(settings: &ScraperSettings) -> PredictorResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| PredictorError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: settings.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_page(&self, url: &str) -> PredictorResult<String> {
        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PredictorError::Transport(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PredictorError::Transport(format!("{} returned {}", url, status)));
        }

        response
            .text()
            .await
            .map_err(|e| PredictorError::Transport(format!("reading body from {} failed: {}", url, e)))
    }

    /// Result icons and replay links on a page, each with its win tier
    pub async fn fetch_replay_page(&self, page_url: &str) -> PredictorResult<ReplayPage> {
        let html = self.fetch_page(page_url).await?;
        let page = ReplayPage::parse(&html);
        debug!("{} icons and {} replay links on {}", page.icons.len(), page.links.len(), page_url);
        Ok(page)
    }
}

#[async_trait]
impl RecordSource for HaotingScraper {
    async fn fetch_records(&self, date: &str) -> PredictorResult<Vec<SessionRecord>> {
        let html = self.fetch_page(&self.url).await?;
        let records = parse_session_rows(&html, date);
        info!("Scraped {} session rows from {}", records.len(), self.url);
        Ok(records)
    }
}

/// Session records from the page's first table. The header row is skipped,
/// as are rows with too few cells or a non-numeric play count.
pub fn parse_session_rows(html: &str, date: &str) -> Vec<SessionRecord> {
    first_table_rows(html)
        .into_iter()
        .skip(1)
        .filter(|cells| cells.len() >= MIN_CELLS)
        .filter_map(|cells| {
            let plays = match cells[1].trim().parse::<u32>() {
                Ok(plays) => plays,
                Err(_) => {
                    debug!("Skipping scraped row with play count '{}'", cells[1]);
                    return None;
                }
            };
            let small_hit = cells[2].contains(SMALL_HIT_MARKER);
            let free_game = cells[2].contains(FREE_GAME_MARKER);
            let jackpot = cells[3].contains(JACKPOT_MARKER);
            Some(SessionRecord::new(date, plays, free_game, small_hit, jackpot))
        })
        .collect()
}

/// Replay links for the tracked game, classified by win tier
pub fn replay_links(html: &str) -> Vec<(String, WinTier)> {
    anchor_hrefs(html)
        .into_iter()
        .filter(|href| href.contains(REPLAY_HOST) && href.contains(REPLAY_GAME))
        .map(|href| {
            let tier = WinTier::classify(&href);
            (href, tier)
        })
        .collect()
}

/// Result icons classified by their image source
pub fn icon_tiers(html: &str) -> Vec<(String, WinTier)> {
    img_srcs(html)
        .into_iter()
        .map(|src| {
            let tier = WinTier::classify(&src);
            (src, tier)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <table>
          <tr><th>#</th><th>局數</th><th>狀態</th><th>結果</th><th>時間</th></tr>
          <tr><td>1</td><td>57</td><td>小分</td><td>未開</td><td>10:00</td></tr>
          <tr><td>2</td><td>88</td><td>免費 小分</td><td>爆金</td><td>10:05</td></tr>
          <tr><td>3</td><td>--</td><td>免費</td><td>爆金</td><td>10:09</td></tr>
          <tr><td>4</td><td>21</td><td>免費</td></tr>
        </table>
        <a href="https://www.godeebxp.com/egames/egyptian-mythology/replay?id=1&amp;tier=mega">r1</a>
        <a href="https://www.godeebxp.com/egames/other-game/replay?id=2&amp;tier=big">r2</a>
        <a href="https://www.godeebxp.com/egames/egyptian-mythology/replay?id=3">r3</a>
    "#;

    #[test]
    fn test_parse_session_rows() {
        let records = parse_session_rows(PAGE, "2024-08-01");
        assert_eq!(records.len(), 2);

        assert_eq!(records[0], SessionRecord::new("2024-08-01", 57, false, true, false));
        assert_eq!(records[1].play_count, 88);
        assert!(records[1].free_game_triggered && records[1].small_hit && records[1].jackpot);
        assert_eq!(records[1].burst_index, 64.4);
    }

    #[test]
    fn test_page_without_table_is_empty() {
        assert!(parse_session_rows("<html><body>maintenance</body></html>", "2024-08-01").is_empty());
    }

    #[test]
    fn test_replay_links_filtered_and_classified() {
        let links = replay_links(PAGE);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].1, WinTier::Mega);
        assert!(links[0].0.ends_with("id=1&tier=mega"));
        assert_eq!(links[1].1, WinTier::NoBurst);
    }

    #[test]
    fn test_icon_tiers() {
        let html = r#"<p>結果</p>
            <img src="/static/win/Super_Win.png"><img src="/static/win/none.png">
            <img src="/static/win/LEGENDARY.gif">"#;
        let icons = icon_tiers(html);
        assert_eq!(
            icons.iter().map(|(_, tier)| *tier).collect::<Vec<_>>(),
            vec![WinTier::Super, WinTier::NoBurst, WinTier::Legendary]
        );
        assert_eq!(icons[0].0, "/static/win/Super_Win.png");
    }

    #[test]
    fn test_replay_page_top_tier() {
        let html = format!(r#"{}<img src="/icons/ultra.png">"#, PAGE);
        let page = ReplayPage::parse(&html);
        assert_eq!(page.icons.len(), 1);
        assert_eq!(page.links.len(), 2);
        assert_eq!(page.top_tier(), WinTier::Ultra);

        assert_eq!(ReplayPage::parse("<p>empty</p>").top_tier(), WinTier::NoBurst);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let settings = ScraperSettings {
            url: "http://127.0.0.1:9/".to_string(),
            connect_timeout_secs: 2,
            request_timeout_secs: 2,
            ..ScraperSettings::default()
        };
        let scraper = HaotingScraper::new(&settings).unwrap();
        let err = scraper.fetch_records("2024-08-01").await.unwrap_err();
        assert!(matches!(err, PredictorError::Transport(_)));
    }
}
