//! Command execution: one method per view, rendering to stdout.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use serde_json::Value;
use tracing::{debug, info};

use super::charts;
use super::feed::FeedController;
use super::output::{
    print_error, print_heading, print_info, print_json, print_metric, print_rows, print_success,
    print_warning, OutputFormat,
};
use super::views::{
    self, ChainView, FeedView, JournalView, KeyValueView, StrategyOrderView, StrategyRiskView,
    TradeView,
};
use super::{JournalCommand, LogTradeArgs, OrderCommand, ViewCommand};
use crate::adapters::api::{BackendClient, BackendClientConfig, HttpBackend};
use crate::adapters::metrics::MetricsRegistry;
use crate::config::AppConfig;
use crate::domain::{
    FeedStatus, FlagLevel, JournalEntry, MarketSnapshot, MaxLoss, ModelOutput, OrderAck,
    OrderRequest, RegimeTone, StrategyDetails, StrategySuggestion, TradeRecord, TradeStatus,
};
use crate::ports::TradingBackend;
use crate::usecases::order_ticket::default_gtt_expiry;
use crate::usecases::{
    Fetched, GttTicket, LegBook, LegDraft, RiskSource, Session, SingleLegTicket, SnapshotSource,
    TradingError,
};

const BAR_WIDTH: usize = 40;

/// Terminal application state: the session plus its feed listener.
pub struct App {
    format: OutputFormat,
    session: Session,
    metrics: MetricsRegistry,
    feed: FeedController,
}

impl App {
    /// Wire the HTTP backend from configuration.
    pub fn new(config: &AppConfig, format: OutputFormat) -> Result<Self> {
        let metrics = MetricsRegistry::new().context("Failed to create metrics registry")?;
        let client = BackendClient::new(BackendClientConfig::from(&config.api))
            .context("Failed to create backend HTTP client")?
            .with_metrics(metrics.clone());
        let backend: Arc<dyn TradingBackend> = Arc::new(HttpBackend::new(client));
        Ok(Self::with_backend(config, format, backend, metrics))
    }

    pub fn with_backend(
        config: &AppConfig,
        format: OutputFormat,
        backend: Arc<dyn TradingBackend>,
        metrics: MetricsRegistry,
    ) -> Self {
        Self {
            format,
            session: Session::new(backend, config.session.market_refetch),
            feed: FeedController::new(config, Some(metrics.clone())),
            metrics,
        }
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub const fn feed(&self) -> &FeedController {
        &self.feed
    }

    pub async fn login(&mut self, raw: &str) -> Result<()> {
        self.session.login(raw).await?;
        print_success("Connected");
        self.print_header();
        Ok(())
    }

    pub async fn logout(&mut self) {
        self.feed.stop().await;
        self.session.logout();
        print_success("Logged out");
    }

    pub fn print_header(&self) {
        match self.session.header_line() {
            Some(line) => println!("{}", line.green()),
            None => print_warning("Not connected. Use `login <token>`."),
        }
    }

    pub fn refresh(&mut self) {
        self.session.refresh_all();
        print_info("Cached views cleared; the next view fetches again.");
    }

    /// Execute one view or action.
    pub async fn run(&mut self, command: ViewCommand) -> Result<()> {
        match command {
            ViewCommand::Dashboard { live, refresh } => self.dashboard(live, refresh).await,
            ViewCommand::Volatility => {
                let output = self.session.volatility().await?;
                self.model_output("Volatility Forecast", &output)
            }
            ViewCommand::Regime => {
                let output = self.session.regime().await?;
                self.model_output("Volatility Regime", &output)
            }
            ViewCommand::Strategies { details, lots } => self.strategies(details, lots).await,
            ViewCommand::PlaceStrategy { strategy, lots } => {
                self.place_strategy(&strategy, lots).await
            }
            ViewCommand::Chain { refresh } => self.chain(refresh).await,
            ViewCommand::Risk { trades_file } => self.risk(trades_file.as_deref()).await,
            ViewCommand::Trades { status } => {
                let fetched = self.session.trades(status).await?;
                let trades = fetched.value.unwrap_or_default();
                if self.format == OutputFormat::Json {
                    return print_json(&trades);
                }
                print_heading(&format!("Trade Log ({status})"));
                print_rows(
                    trades.iter().map(TradeView::from).collect(),
                    "No trades found for the selected filter.",
                );
                Ok(())
            }
            ViewCommand::LogTrade(args) => self.log_trade(args).await,
            ViewCommand::Journal { command } => self.journal(command).await,
            ViewCommand::Order { command } => self.order(command).await,
            ViewCommand::Metrics => {
                print!("{}", self.metrics.render()?);
                Ok(())
            }
        }
    }

    async fn dashboard(&mut self, live: bool, refresh: bool) -> Result<()> {
        if refresh {
            self.session.refresh_overview();
        }
        let source = if live {
            SnapshotSource::Live
        } else {
            SnapshotSource::OptionSeller
        };
        let fetched = self.session.overview(source).await?;
        let Some(overview) = fetched.value else {
            print_info("No market data available.");
            return Ok(());
        };

        if self.format == OutputFormat::Json {
            return print_json(&serde_json::json!({
                "snapshot": overview.snapshot,
                "suggestion": overview.suggestion,
            }));
        }

        self.print_header();
        render_snapshot(&overview.snapshot);
        render_suggestion(&overview.suggestion);
        if !fetched.fresh {
            print_info(&format!(
                "Cached data from {}. Use `dashboard --refresh` to fetch again.",
                local_time(fetched.fetched_at)
            ));
        }
        Ok(())
    }

    fn model_output(&self, title: &str, output: &ModelOutput) -> Result<()> {
        if self.format == OutputFormat::Json {
            return print_json(output);
        }
        print_heading(title);
        print_rows(
            output
                .entries()
                .into_iter()
                .map(|(key, value)| KeyValueView { key, value })
                .collect(),
            "The model returned no output.",
        );
        Ok(())
    }

    async fn strategies(&mut self, details: bool, lots: u32) -> Result<()> {
        let suggestion = self.session.suggestions().await?;
        let mut all_details = Vec::new();
        if details {
            for name in &suggestion.strategies {
                let result = self.session.strategy_details(name, lots).await;
                all_details.push((name.clone(), result));
            }
        }

        if self.format == OutputFormat::Json {
            let details: serde_json::Map<String, Value> = all_details
                .iter()
                .map(|(name, result)| {
                    let value = match result {
                        Ok(d) => serde_json::to_value(d).unwrap_or(Value::Null),
                        Err(e) => serde_json::json!({ "error": e.to_string() }),
                    };
                    (name.clone(), value)
                })
                .collect();
            return print_json(&serde_json::json!({
                "suggestion": suggestion,
                "details": details,
            }));
        }

        render_suggestion(&suggestion);
        for (name, result) in &all_details {
            match result {
                Ok(d) => render_details(name, lots, d),
                Err(e) => print_error(&format!("{name}: {e}")),
            }
        }
        Ok(())
    }

    async fn place_strategy(&mut self, strategy: &str, lots: u32) -> Result<()> {
        let placement = self.session.place_strategy(strategy, lots).await?;
        if self.format == OutputFormat::Json {
            return print_json(&placement.ack);
        }
        render_details(strategy, lots, &placement.details);
        print_success(&format!(
            "Strategy '{strategy}' placed: {}",
            placement.ack.summary()
        ));
        Ok(())
    }

    async fn chain(&mut self, refresh: bool) -> Result<()> {
        if refresh {
            self.session.refresh_chain();
        }
        let fetched = self.session.chain().await?;
        let rows = fetched.value.unwrap_or_default();
        if self.format == OutputFormat::Json {
            return print_json(&rows);
        }

        print_heading("Option Chain Analysis");
        print_rows(
            rows.iter().map(ChainView::from).collect(),
            "No option chain data available.",
        );
        if let Some(line) = charts::skew_line(&rows) {
            print_heading("IV Skew Across Strikes");
            println!("  {line}");
        }
        Ok(())
    }

    async fn risk(&mut self, trades_file: Option<&Path>) -> Result<()> {
        let source = match trades_file {
            Some(path) => RiskSource::Provided(read_trades_file(path).await?),
            None => RiskSource::OpenTrades,
        };

        let review = match self.session.risk_review(source).await {
            Ok(review) => review,
            Err(TradingError::NoActiveTrades) => {
                print_info("No active trades to evaluate.");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let evaluation = review.evaluation;
        if self.format == OutputFormat::Json {
            return print_json(&evaluation);
        }

        let p = &evaluation.portfolio;
        print_heading(&format!("Portfolio Summary ({} active trades)", review.trades));
        print_metric("Total Funds", &views::rupees(p.total_funds));
        print_metric("Capital Deployed", &views::rupees(p.capital_deployed));
        print_metric("Exposure", &views::percent(p.exposure_percent));
        print_metric("Risk on Table", &views::rupees(p.risk_on_table));
        print_metric("Total Vega", &views::fixed(p.total_vega, 2));

        if !p.flags.is_empty() {
            print_heading("Flags");
            for flag in &p.flags {
                match FlagLevel::classify(flag) {
                    FlagLevel::Breach => print_error(flag),
                    FlagLevel::Ok => print_success(flag),
                }
            }
        }

        print_heading("Strategy Breakdown");
        print_rows(
            evaluation.summary.iter().map(StrategyRiskView::from).collect(),
            "No per-strategy breakdown returned.",
        );

        let groups = charts::capital_groups(&evaluation.summary);
        if !groups.is_empty() {
            print_heading("Capital Utilization by Strategy");
            for line in charts::grouped_bars(&groups, "used", "cap limit", BAR_WIDTH) {
                println!("  {line}");
            }
        }
        Ok(())
    }

    async fn log_trade(&mut self, args: LogTradeArgs) -> Result<()> {
        let trade = TradeRecord {
            strategy: args.strategy,
            instrument_token: args.instrument,
            entry_price: args.entry_price,
            quantity: args.quantity,
            realized_pnl: args.realized_pnl,
            unrealized_pnl: args.unrealized_pnl,
            capital_used: args.capital_used,
            potential_loss: args.potential_loss,
            sl_hit: args.sl_hit,
            vega: args.vega,
            status: if args.closed {
                TradeStatus::Closed
            } else {
                TradeStatus::Open
            },
            ..TradeRecord::default()
        };
        let ack = self.session.log_trade(&trade).await?;
        self.print_ack("Trade logged", &ack)
    }

    async fn journal(&mut self, command: JournalCommand) -> Result<()> {
        match command {
            JournalCommand::Add {
                title,
                content,
                mood,
                tags,
            } => {
                let ack = self.session.add_journal(&title, &content, mood, &tags).await?;
                self.print_ack("Journal entry saved", &ack)
            }
            JournalCommand::List { refresh } => {
                if refresh {
                    self.session.refresh_journals();
                }
                let fetched = self.session.journals().await?;
                self.render_journals(fetched)
            }
        }
    }

    fn render_journals(&self, fetched: Fetched<Vec<JournalEntry>>) -> Result<()> {
        let entries = fetched.value.unwrap_or_default();
        if self.format == OutputFormat::Json {
            return print_json(&entries);
        }
        print_heading("Trading Journal");
        print_rows(
            entries.iter().map(JournalView::from).collect(),
            "No journal entries found.",
        );
        Ok(())
    }

    async fn order(&mut self, command: OrderCommand) -> Result<()> {
        let today = Local::now().date_naive();
        let ack = match command {
            OrderCommand::Single {
                common,
                price_type,
                price,
                trigger_price,
            } => {
                let ticket = SingleLegTicket {
                    common: common.to_params(),
                    price_type,
                    price,
                    trigger_price,
                };
                let order = ticket.build()?;
                self.session.submit_order(&OrderRequest::Single(order)).await?
            }
            OrderCommand::Gtt {
                common,
                price,
                trigger_price,
                expiry,
            } => {
                let ticket = GttTicket {
                    price,
                    trigger_price,
                    expiry: expiry.unwrap_or_else(|| default_gtt_expiry(today)),
                    ..GttTicket::new(common.to_params(), today)
                };
                let order = ticket.build(today)?;
                self.session.submit_order(&OrderRequest::Gtt(order)).await?
            }
            OrderCommand::Multi { common, legs } => {
                self.load_legs(&legs)?;
                self.session.submit_leg_book(&common.to_params()).await?
            }
            OrderCommand::MultiGtt {
                common,
                legs,
                trigger_price,
                expiry,
            } => {
                self.load_legs(&legs)?;
                let expiry = expiry.unwrap_or_else(|| default_gtt_expiry(today));
                self.session
                    .submit_leg_book_gtt(&common.to_params(), trigger_price, expiry, today)
                    .await?
            }
        };
        self.print_ack("Order placed", &ack)
    }

    /// Replace the leg book with `--leg` specs; none keeps the book as is.
    fn load_legs(&mut self, specs: &[String]) -> Result<()> {
        if specs.is_empty() {
            return Ok(());
        }
        let legs = specs
            .iter()
            .map(|s| LegDraft::parse(s))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(legs = legs.len(), "Leg book loaded from command line");
        *self.session.legs_mut() = LegBook::from_legs(legs);
        Ok(())
    }

    fn print_ack(&self, what: &str, ack: &OrderAck) -> Result<()> {
        if self.format == OutputFormat::Json {
            return print_json(ack);
        }
        print_success(&format!("{what}: {}", ack.summary()));
        Ok(())
    }

    /// Start the live feed in the background.
    pub async fn feed_start(&mut self) -> Result<()> {
        let token = self.session.require_token()?;
        if self.feed.start(self.session.backend(), token).await? {
            print_success("Live feed listener started.");
        } else {
            print_info("Live feed listener is already running.");
        }
        Ok(())
    }

    pub async fn feed_show(&self, limit: usize) -> Result<()> {
        let messages = self.feed.recent(limit).await;
        if self.format == OutputFormat::Json {
            return print_json(&messages);
        }
        print_info(&format!(
            "Feed {} | buffered {} of {} | received {}",
            self.feed.status(),
            messages.len(),
            self.feed.capacity(),
            self.feed.total_received().await,
        ));
        print_rows(
            messages.iter().map(FeedView::from).collect(),
            "No live feed data yet.",
        );
        Ok(())
    }

    pub async fn feed_stop(&mut self) {
        if self.feed.stop().await {
            print_success("Live feed listener stopped.");
        } else {
            print_info("Live feed listener is not running.");
        }
    }

    /// Listen for `seconds`, stop, then print the buffer.
    pub async fn feed_for(&mut self, seconds: u64) -> Result<()> {
        self.feed_start().await?;
        info!(seconds, "Listening to the live feed");
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
            _ = tokio::signal::ctrl_c() => info!("Interrupted, stopping feed"),
        }
        let status = self.feed.status();
        self.feed.stop().await;
        if let FeedStatus::Failed(reason) = &status {
            print_error(&format!("Live feed failed: {reason}"));
        }
        self.feed_show(self.feed.capacity()).await
    }

    pub async fn shutdown(&mut self) {
        self.feed.stop().await;
    }
}

async fn read_trades_file(path: &Path) -> Result<Vec<TradeRecord>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read trades file {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Trades file {} is not valid JSON", path.display()))?;
    let list = match value {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => match map.remove("active_trades") {
            Some(list) => list,
            None => bail!("Trades file must hold a list or an `active_trades` list"),
        },
        _ => bail!("Trades file must hold a list or an `active_trades` list"),
    };
    serde_json::from_value(list).context("Trades file holds malformed trades")
}

fn local_time(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(
        || views::NA.to_string(),
        |t| t.with_timezone(&Local).format("%H:%M:%S").to_string(),
    )
}

fn render_snapshot(s: &MarketSnapshot) {
    let mut section = "";
    for row in views::snapshot_rows(s) {
        if row.section != section {
            section = row.section;
            print_heading(section);
        }
        print_metric(row.metric, &row.value);
    }
}

fn render_suggestion(s: &StrategySuggestion) {
    print_heading("Strategy Suggestions");
    let regime = s.regime.as_deref().unwrap_or(views::NA);
    let regime = match s.regime_tone() {
        RegimeTone::Elevated => regime.red().bold(),
        RegimeTone::Calm => regime.yellow().bold(),
        RegimeTone::Neutral => regime.green().bold(),
    };
    print_metric("Current Volatility Regime", &regime.to_string());
    print_metric("Regime Score", &views::fixed(s.score, 2));
    print_metric("Regime Summary", s.note.as_deref().unwrap_or(views::NA));
    print_metric(
        "Regime Implications",
        s.explanation.as_deref().unwrap_or(views::NA),
    );
    if let Some(warning) = s.event_warning.as_deref().filter(|w| !w.trim().is_empty()) {
        print_warning(warning);
    }

    if s.strategies.is_empty() {
        print_info("No strategies suggested.");
    } else {
        println!("  {}", "Recommended strategies:".dimmed());
        for (i, name) in s.strategies.iter().enumerate() {
            println!("    {}. {}", i + 1, name.bold());
        }
    }
    if let Some(rationale) = &s.rationale {
        println!("  {}", "Rationale:".dimmed());
        for point in rationale.points() {
            println!("    - {point}");
        }
    }
}

fn render_details(name: &str, lots: u32, d: &StrategyDetails) {
    print_heading(&format!("{name} ({lots} lot{})", if lots == 1 { "" } else { "s" }));
    print_metric("Premium", &views::rupees(Some(d.premium_total)));
    print_metric("Max Profit", &views::rupees(Some(d.max_profit)));
    let max_loss = match d.max_loss {
        MaxLoss::Bounded(v) => views::rupees(Some(v)),
        MaxLoss::Unlimited => "Unlimited".to_string(),
    };
    print_metric("Max Loss", &max_loss);
    if !d.strikes.is_empty() {
        let strikes: Vec<String> = d.strikes.iter().map(|s| views::rupees(Some(*s))).collect();
        print_metric("Strikes", &strikes.join(", "));
    }
    print_rows(
        d.orders.iter().map(StrategyOrderView::from).collect(),
        "No orders proposed.",
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[tokio::test]
    async fn test_read_trades_file_accepts_both_shapes() {
        let mut bare = tempfile::NamedTempFile::new().unwrap();
        write!(
            bare,
            r#"[{{"strategy": "Iron Fly", "instrument_token": "NSE_FO|NIFTY", "entry_price": 22000, "quantity": 50}}]"#
        )
        .unwrap();
        let trades = read_trades_file(bare.path()).await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].strategy, "Iron Fly");

        let mut wrapped = tempfile::NamedTempFile::new().unwrap();
        write!(wrapped, r#"{{"active_trades": []}}"#).unwrap();
        assert!(read_trades_file(wrapped.path()).await.unwrap().is_empty());

        let mut wrong = tempfile::NamedTempFile::new().unwrap();
        write!(wrong, r#"{{"trades": []}}"#).unwrap();
        assert!(read_trades_file(wrong.path()).await.is_err());
    }
}
