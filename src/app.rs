//! The page: owns every piece of UI state and applies actions one at a time
//!
//! Network work runs on spawned tasks that post a result action back to the
//! event loop. Each request kind carries a sequence number so a slow, stale
//! response never overwrites a newer one.

use chrono::{Local, NaiveDate};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::api::proxy::{
    ApiError, ConvertResponse, HistoryResponse, PriceResponse, ProxyClient, TopQuery, TopResponse,
};
use crate::commands::HELP_TEXT;
use crate::config::Config;
use crate::models::Row;
use crate::services::chart_service::{default_range, parse_date, ChartLayout, ChartSurface, HistoryRequest};
use crate::services::convert_service::{ConvertRequest, ConverterPanel, CACHE_MARK};
use crate::services::hover_service::DisplayBox;
use crate::services::price_service::{describe_quote, QuoteRequest};
use crate::services::table_service::{SortKey, TableController};
use crate::utils::errors::{user_message, AppError};
use crate::utils::scheduler::{Debouncer, ScheduledTask, Scheduler};
use crate::utils::theme::{Theme, ThemeStore};
use crate::view::{ChartSummary, Toast, ToastLevel, View};

/// Trailing debounce of the filter input
pub const FILTER_DEBOUNCE: Duration = Duration::from_millis(150);

/// How long a toast stays up unless replaced
pub const TOAST_TTL: Duration = Duration::from_millis(3200);

const SUGGESTION_LIMIT: usize = 10;

#[derive(Debug)]
pub enum Action {
    LoadTop {
        vs: Option<String>,
        per_page: Option<u32>,
    },
    /// A keystroke in the filter box
    FilterInput(String),
    /// Debounced filter value
    ApplyFilter(String),
    SortBy(SortKey),
    Convert {
        coin_id: String,
        vs: String,
        amount: String,
    },
    Quote {
        coin_id: String,
        vs: Option<String>,
    },
    History {
        coin_id: Option<String>,
        vs: Option<String>,
        from: Option<String>,
        to: Option<String>,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerLeave,
    ToggleTheme,
    ShowCsvLink,
    SuggestCoins(String),
    Help,

    TopLoaded {
        seq: u64,
        query: TopQuery,
        result: Result<TopResponse, ApiError>,
    },
    Converted {
        seq: u64,
        request: ConvertRequest,
        result: Result<ConvertResponse, ApiError>,
    },
    HistoryLoaded {
        seq: u64,
        request: HistoryRequest,
        result: Result<HistoryResponse, ApiError>,
    },
    Quoted {
        seq: u64,
        request: QuoteRequest,
        result: Result<PriceResponse, ApiError>,
    },
    DismissToast(u64),
}

impl Action {
    /// Result of a request spawned by the app
    fn is_response(&self) -> bool {
        matches!(
            self,
            Action::TopLoaded { .. }
                | Action::Converted { .. }
                | Action::HistoryLoaded { .. }
                | Action::Quoted { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Top,
    Convert,
    History,
    Quote,
}

/// Latest issued sequence number per request kind
#[derive(Debug, Default)]
struct RequestSeq {
    latest: [u64; 4],
}

impl RequestSeq {
    fn slot(kind: RequestKind) -> usize {
        match kind {
            RequestKind::Top => 0,
            RequestKind::Convert => 1,
            RequestKind::History => 2,
            RequestKind::Quote => 3,
        }
    }

    fn issue(&mut self, kind: RequestKind) -> u64 {
        let slot = &mut self.latest[Self::slot(kind)];
        *slot += 1;
        *slot
    }

    fn is_current(&self, kind: RequestKind, seq: u64) -> bool {
        self.latest[Self::slot(kind)] == seq
    }
}

/// Current values of the history form
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryForm {
    pub coin_id: String,
    pub vs: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl HistoryForm {
    pub fn new(vs: &str, today: NaiveDate) -> Self {
        let (from, to) = default_range(today);
        Self {
            coin_id: "bitcoin".to_string(),
            vs: vs.to_string(),
            from,
            to,
        }
    }
}

pub struct App<V: View> {
    config: Config,
    client: ProxyClient,
    view: V,
    scheduler: Scheduler<Action>,
    table: TableController,
    converter: ConverterPanel,
    chart: ChartSurface,
    display: DisplayBox,
    form: HistoryForm,
    query: TopQuery,
    filter_debounce: Debouncer,
    toast_id: u64,
    toast_timer: Option<ScheduledTask>,
    theme_store: ThemeStore,
    theme: Theme,
    seq: RequestSeq,
    pending: usize,
    booted: bool,
}

impl<V: View> App<V> {
    pub fn new(config: Config, client: ProxyClient, view: V, scheduler: Scheduler<Action>) -> Self {
        let (width, height) = config.chart_size;
        let (css_width, css_height) = config.display_size;
        let theme = Theme::Light;

        Self {
            client,
            view,
            scheduler,
            table: TableController::new(),
            converter: ConverterPanel::new(),
            chart: ChartSurface::new(ChartLayout::new(width, height), theme.palette()),
            display: DisplayBox::new(css_width, css_height),
            form: HistoryForm::new(&config.vs, Local::now().date_naive()),
            query: TopQuery::new(&config.vs, config.per_page),
            filter_debounce: Debouncer::new(FILTER_DEBOUNCE),
            toast_id: 0,
            toast_timer: None,
            theme_store: ThemeStore::new(config.theme_file.clone()),
            theme,
            seq: RequestSeq::default(),
            pending: 0,
            booted: false,
            config,
        }
    }

    /// Requests sent whose result action has not been handled yet
    pub fn pending_requests(&self) -> usize {
        self.pending
    }

    /// One-time page setup. Returns false if already done.
    pub fn bootstrap(&mut self) -> bool {
        if self.booted {
            return false;
        }
        self.booted = true;

        self.chart.attach_hover();

        let theme = match self.theme_store.load() {
            Ok(theme) => theme,
            Err(e) => {
                warn!("Failed to read theme flag, using light theme: {}", e);
                Theme::Light
            }
        };
        if let Err(e) = self.apply_theme(theme) {
            self.report(e);
        }

        info!(
            "History form defaults: {}/{} {} → {}",
            self.form.coin_id, self.form.vs, self.form.from, self.form.to
        );
        self.handle(Action::LoadTop { vs: None, per_page: None });
        true
    }

    /// Apply one action; errors end here, shown to the user
    pub fn handle(&mut self, action: Action) {
        if action.is_response() {
            self.pending = self.pending.saturating_sub(1);
        }

        let result = match action {
            Action::LoadTop { vs, per_page } => self.load_top(vs, per_page),
            Action::FilterInput(text) => {
                self.filter_debounce.call(&self.scheduler, Action::ApplyFilter(text));
                Ok(())
            }
            Action::ApplyFilter(text) => {
                self.table.set_filter(&text);
                self.view.show_table(&self.table.snapshot());
                Ok(())
            }
            Action::SortBy(key) => {
                self.table.click_header(key);
                self.view.show_table(&self.table.snapshot());
                Ok(())
            }
            Action::Convert { coin_id, vs, amount } => {
                self.convert(&coin_id, &vs, &amount);
                Ok(())
            }
            Action::Quote { coin_id, vs } => self.quote(&coin_id, vs),
            Action::History { coin_id, vs, from, to } => self.history(coin_id, vs, from, to),
            Action::PointerMove { x, y } => self.pointer_move(x, y),
            Action::PointerLeave => self.pointer_leave(),
            Action::ToggleTheme => self.toggle_theme(),
            Action::ShowCsvLink => self.show_csv_link(),
            Action::SuggestCoins(prefix) => {
                let ids = self.table.suggest(&prefix, SUGGESTION_LIMIT);
                let text = if ids.is_empty() {
                    format!("No loaded coin ids start with '{}'", prefix)
                } else {
                    ids.join(", ")
                };
                self.view.show_text(&text);
                Ok(())
            }
            Action::Help => {
                self.view.show_text(HELP_TEXT);
                Ok(())
            }
            Action::TopLoaded { seq, query, result } => self.top_loaded(seq, query, result),
            Action::Converted { seq, request, result } => {
                self.converted(seq, &request, result);
                Ok(())
            }
            Action::HistoryLoaded { seq, request, result } => self.history_loaded(seq, request, result),
            Action::Quoted { seq, request, result } => self.quoted(seq, &request, result),
            Action::DismissToast(id) => {
                if id == self.toast_id {
                    self.toast_timer = None;
                    self.view.hide_toast(id);
                }
                Ok(())
            }
        };

        if let Err(e) = result {
            self.report(e);
        }
    }

    fn report(&mut self, err: AppError) {
        match &err {
            AppError::Validation(msg) => warn!("Rejected input: {}", msg),
            other => error!("Action failed: {}", other),
        }
        self.toast(ToastLevel::Error, user_message(&err));
    }

    /// Show a toast, replacing any current one and its timer
    fn toast(&mut self, level: ToastLevel, message: String) {
        if let Some(timer) = self.toast_timer.take() {
            timer.cancel();
        }
        self.toast_id += 1;
        let id = self.toast_id;
        self.view.show_toast(&Toast { id, level, message });
        self.toast_timer = Some(self.scheduler.schedule(TOAST_TTL, Action::DismissToast(id)));
    }

    fn load_top(&mut self, vs: Option<String>, per_page: Option<u32>) -> Result<(), AppError> {
        let query = TopQuery::new(
            vs.as_deref().unwrap_or(&self.query.vs),
            per_page.unwrap_or(self.query.per_page),
        );
        if query.vs.is_empty() {
            return Err(AppError::Validation("Enter a currency (e.g. usd)".to_string()));
        }
        self.query = query.clone();

        let seq = self.seq.issue(RequestKind::Top);
        info!("Loading top {} coins in {} (#{})", query.per_page, query.vs, seq);

        let client = self.client.clone();
        self.pending += 1;
        self.scheduler.spawn(async move {
            let result = client.top(&query).await;
            Action::TopLoaded { seq, query, result }
        });
        Ok(())
    }

    fn top_loaded(
        &mut self,
        seq: u64,
        query: TopQuery,
        result: Result<TopResponse, ApiError>,
    ) -> Result<(), AppError> {
        if !self.seq.is_current(RequestKind::Top, seq) {
            debug!("Dropping stale top-coins response #{}", seq);
            return Ok(());
        }

        match result {
            Ok(response) => {
                let csv_link = match self.client.top_csv_url(&query) {
                    Ok(url) => Some(url.to_string()),
                    Err(e) => {
                        warn!("Could not build CSV link: {}", e);
                        None
                    }
                };
                let rows: Vec<Row> = response.items.into_iter().map(Row::from).collect();
                let count = rows.len();
                self.table.replace_rows(rows, response.cached, csv_link);
                self.view.show_table(&self.table.snapshot());

                let mut message = format!("Loaded {} coins ({})", count, query.vs);
                if response.cached {
                    message.push_str(CACHE_MARK);
                }
                self.toast(ToastLevel::Info, message);
                Ok(())
            }
            Err(e) => {
                self.table.clear();
                self.view.show_table(&self.table.snapshot());
                Err(e.into())
            }
        }
    }

    /// Validation failures stay in the converter's result region
    fn convert(&mut self, coin_id: &str, vs: &str, amount: &str) {
        // Issued before validation so a rejected form also retires older responses
        let seq = self.seq.issue(RequestKind::Convert);
        let request = match self.converter.begin(coin_id, vs, amount) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejected conversion: {}", e);
                self.view.show_converter(self.converter.display());
                return;
            }
        };
        self.view.show_converter(self.converter.display());

        let client = self.client.clone();
        self.pending += 1;
        self.scheduler.spawn(async move {
            let result = client.convert(&request.coin_id, &request.vs, request.amount).await;
            Action::Converted { seq, request, result }
        });
    }

    fn converted(&mut self, seq: u64, request: &ConvertRequest, result: Result<ConvertResponse, ApiError>) {
        if !self.seq.is_current(RequestKind::Convert, seq) {
            debug!("Dropping stale conversion #{}", seq);
            return;
        }
        if let Err(e) = &result {
            error!("Conversion failed: {}", e);
        }
        self.converter.complete(request, result);
        self.view.show_converter(self.converter.display());
    }

    fn quote(&mut self, coin_id: &str, vs: Option<String>) -> Result<(), AppError> {
        let request = QuoteRequest::parse(coin_id, vs.as_deref().unwrap_or(&self.query.vs))?;
        let seq = self.seq.issue(RequestKind::Quote);
        info!("Fetching quote for {}/{}", request.coin_id, request.vs);

        let client = self.client.clone();
        self.pending += 1;
        self.scheduler.spawn(async move {
            let result = client.price(&request.coin_id, &request.vs, true).await;
            Action::Quoted { seq, request, result }
        });
        Ok(())
    }

    fn quoted(
        &mut self,
        seq: u64,
        request: &QuoteRequest,
        result: Result<PriceResponse, ApiError>,
    ) -> Result<(), AppError> {
        if !self.seq.is_current(RequestKind::Quote, seq) {
            debug!("Dropping stale quote #{} for {}", seq, request.coin_id);
            return Ok(());
        }
        let response = result?;
        self.view.show_text(&describe_quote(&response));
        Ok(())
    }

    fn history(
        &mut self,
        coin_id: Option<String>,
        vs: Option<String>,
        from: Option<String>,
        to: Option<String>,
    ) -> Result<(), AppError> {
        let from = match from {
            Some(value) => parse_date(&value)?,
            None => self.form.from,
        };
        let to = match to {
            Some(value) => parse_date(&value)?,
            None => self.form.to,
        };
        let request = HistoryRequest::new(
            coin_id.as_deref().unwrap_or(&self.form.coin_id),
            vs.as_deref().unwrap_or(&self.form.vs),
            from,
            to,
        )?;

        self.form = HistoryForm {
            coin_id: request.coin_id.clone(),
            vs: request.vs.clone(),
            from: request.from,
            to: request.to,
        };

        let seq = self.seq.issue(RequestKind::History);
        info!("Loading history {} (#{})", request.caption(), seq);

        let client = self.client.clone();
        self.pending += 1;
        self.scheduler.spawn(async move {
            let result = client
                .history(&request.coin_id, &request.vs, request.from, request.to)
                .await;
            Action::HistoryLoaded { seq, request, result }
        });
        Ok(())
    }

    fn history_loaded(
        &mut self,
        seq: u64,
        request: HistoryRequest,
        result: Result<HistoryResponse, ApiError>,
    ) -> Result<(), AppError> {
        if !self.seq.is_current(RequestKind::History, seq) {
            debug!("Dropping stale history response #{}", seq);
            return Ok(());
        }

        let response = result?;
        let caption = request.caption();
        let points = self.chart.draw(&response.points, &caption)?.len();
        let file = self.export_chart()?;
        self.view.show_chart(&ChartSummary {
            caption: &caption,
            points,
            file: file.as_deref(),
        });

        let mut message = format!("History: {} points", points);
        if response.cached {
            message.push_str(CACHE_MARK);
        }
        self.toast(ToastLevel::Info, message);
        Ok(())
    }

    /// Write the current frame if export is configured
    fn export_chart(&self) -> Result<Option<std::path::PathBuf>, AppError> {
        match &self.config.chart_path {
            Some(path) => {
                self.chart.export_png(path)?;
                Ok(Some(path.clone()))
            }
            None => Ok(None),
        }
    }

    fn pointer_move(&mut self, x: f64, y: f64) -> Result<(), AppError> {
        let outcome = self.chart.pointer_move(x, y, &self.display)?;
        self.view.show_hover(&outcome);
        self.export_chart()?;
        Ok(())
    }

    fn pointer_leave(&mut self) -> Result<(), AppError> {
        let outcome = self.chart.pointer_leave()?;
        self.view.show_hover(&outcome);
        self.export_chart()?;
        Ok(())
    }

    fn apply_theme(&mut self, theme: Theme) -> Result<(), AppError> {
        self.theme = theme;
        self.chart.set_palette(theme.palette())?;
        self.view.show_theme(theme);
        Ok(())
    }

    /// Flip the theme and persist the new flag
    fn toggle_theme(&mut self) -> Result<(), AppError> {
        self.apply_theme(self.theme.toggled())?;
        self.theme_store.save(self.theme)?;
        debug!("Saved theme flag to {}", self.theme_store.path().display());
        Ok(())
    }

    fn show_csv_link(&mut self) -> Result<(), AppError> {
        let link = match self.table.snapshot().csv_link {
            Some(link) => link,
            None => self.client.top_csv_url(&self.query)?.to_string(),
        };
        self.view.show_text(&format!("CSV: {}", link));
        Ok(())
    }
}
