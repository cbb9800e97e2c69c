//! Client side of the contact form.
//!
//! [`ContactFormClient`] owns the three form fields and the form status. A
//! submission posts the fields to `/api/contact` once, then the status
//! settles on [`FormStatus::Success`] or [`FormStatus::Error`] and falls back
//! to [`FormStatus::Idle`] after the configured reset delay.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use anyhow::{ensure, Context};
use portfolio_utils::portfolio_version;
use serde::Serialize;
use tokio::{runtime::Handle, sync::watch, task::AbortHandle};
use tracing::{debug, error, warn};
use url::Url;

pub const CONTACT_PATH: &str = "api/contact";

pub const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStatus {
    Idle,
    Submitting,
    Success,
    Error,
}

impl FormStatus {
    pub fn is_submitting(self) -> bool {
        matches!(self, Self::Submitting)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactFormFields {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFormClientConfig {
    /// Absolute url of the contact endpoint.
    pub endpoint: Url,
    /// Time after which a finished submission returns to [`FormStatus::Idle`].
    pub reset_delay: Duration,
}

impl ContactFormClientConfig {
    /// Configuration for the contact endpoint of the server at `base_url`.
    pub fn new(base_url: &Url) -> anyhow::Result<Self> {
        let endpoint = base_url
            .join(CONTACT_PATH)
            .with_context(|| format!("Invalid server url {base_url}"))?;
        Ok(Self {
            endpoint,
            reset_delay: DEFAULT_RESET_DELAY,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("A submission is already in progress.")]
pub struct SubmissionInFlight;

#[derive(Debug, Clone)]
pub struct ContactFormClient(Arc<Inner>);

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    config: ContactFormClientConfig,
    state: Mutex<State>,
    status_tx: watch::Sender<FormStatus>,
}

#[derive(Debug)]
struct State {
    fields: ContactFormFields,
    status: FormStatus,
    reset: Option<AbortHandle>,
    /// Incremented by every submission, so a reset scheduled by an earlier
    /// submission never applies to a later one.
    generation: u64,
}

impl ContactFormClient {
    pub fn new(config: ContactFormClientConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!(
                "Portfolio Contact Client (Version {})",
                portfolio_version()
            ))
            .build()
            .context("Failed to build http client")?;

        Ok(Self(Arc::new(Inner {
            http,
            config,
            state: Mutex::new(State {
                fields: Default::default(),
                status: FormStatus::Idle,
                reset: None,
                generation: 0,
            }),
            status_tx: watch::Sender::new(FormStatus::Idle),
        })))
    }

    pub fn fields(&self) -> ContactFormFields {
        self.0.lock().fields.clone()
    }

    pub fn status(&self) -> FormStatus {
        self.0.lock().status
    }

    /// Receive every status transition.
    pub fn subscribe(&self) -> watch::Receiver<FormStatus> {
        self.0.status_tx.subscribe()
    }

    /// Modify the form fields. Refused while a submission is in flight.
    pub fn edit(&self, f: impl FnOnce(&mut ContactFormFields)) -> Result<(), SubmissionInFlight> {
        let mut state = self.0.lock();
        if state.status.is_submitting() {
            return Err(SubmissionInFlight);
        }
        f(&mut state.fields);
        Ok(())
    }

    /// Submit the current fields and return the resulting status.
    ///
    /// Issues exactly one request. While a submission is in flight, further
    /// calls are refused without contacting the server. A pending reset from
    /// a previous submission is cancelled before the new one starts. If the
    /// returned future is dropped before the response arrives, the form
    /// settles on [`FormStatus::Error`] and resets as usual.
    pub async fn submit(&self) -> Result<FormStatus, SubmissionInFlight> {
        let (fields, guard) = {
            let mut state = self.0.lock();
            if state.status.is_submitting() {
                return Err(SubmissionInFlight);
            }
            if let Some(reset) = state.reset.take() {
                reset.abort();
            }
            state.generation += 1;
            self.0.set_status(&mut state, FormStatus::Submitting);
            (state.fields.clone(), InFlight::new(&self.0, state.generation))
        };

        let status = match self.0.post(&fields).await {
            Ok(()) => FormStatus::Success,
            Err(err) => {
                error!("Failed to submit contact form: {err:#}");
                FormStatus::Error
            }
        };

        guard.complete(status);
        Ok(status)
    }
}

/// Settles a submission exactly once, even when the future driving it is
/// dropped.
struct InFlight<'a> {
    inner: &'a Arc<Inner>,
    generation: u64,
    done: bool,
}

impl<'a> InFlight<'a> {
    fn new(inner: &'a Arc<Inner>, generation: u64) -> Self {
        Self {
            inner,
            generation,
            done: false,
        }
    }

    fn complete(mut self, status: FormStatus) {
        self.done = true;
        self.inner.complete(self.generation, status);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            warn!("Contact form submission was cancelled");
            self.inner.complete(self.generation, FormStatus::Error);
        }
    }
}

impl Inner {
    fn complete(self: &Arc<Self>, generation: u64, status: FormStatus) {
        let mut state = self.lock();
        if state.generation != generation || !state.status.is_submitting() {
            return;
        }
        if status == FormStatus::Success {
            state.fields = Default::default();
        }
        self.set_status(&mut state, status);
        state.reset = schedule_reset(Arc::downgrade(self), generation, self.config.reset_delay);
        if state.reset.is_none() {
            self.set_status(&mut state, FormStatus::Idle);
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, state: &mut State, status: FormStatus) {
        debug!(from = ?state.status, to = ?status, "contact form status changed");
        state.status = status;
        self.status_tx.send_replace(status);
    }

    async fn post(&self, fields: &ContactFormFields) -> anyhow::Result<()> {
        let response = self
            .http
            .post(self.config.endpoint.clone())
            .json(fields)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response
            .json::<serde_json::Value>()
            .await
            .with_context(|| format!("Failed to parse response (status {status})"))?;

        ensure!(
            status.is_success(),
            "Server responded with status {status}: {body}"
        );

        Ok(())
    }
}

/// Returns `None` when there is no runtime left to run the reset on.
fn schedule_reset(inner: Weak<Inner>, generation: u64, delay: Duration) -> Option<AbortHandle> {
    let runtime = Handle::try_current().ok()?;
    let task = runtime.spawn(async move {
        tokio::time::sleep(delay).await;

        let Some(inner) = inner.upgrade() else {
            return;
        };
        let mut state = inner.lock();
        if state.generation == generation && !state.status.is_submitting() {
            state.reset = None;
            inner.set_status(&mut state, FormStatus::Idle);
        }
    });
    Some(task.abort_handle())
}
