//! Orchard sensor alerts delivered as SMS.
//!
//! [`evaluate`] is pure: it turns one sensor reading into zero or more [`Alert`]s, using an
//! [`AlertState`] to send motion and intrusion alerts only once until [`AlertState::reset`].
//! [`AlertNotifier`] delivers alerts through the normal normalize-then-dispatch path.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dispatcher::{DispatchError, Dispatcher};
use crate::domain::{MessageText, SendOptions, SendSms, SendSmsResponse, SenderId};
use crate::normalizer::Normalizer;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Inclusive acceptable range for one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub min: f64,
    pub max: f64,
}

impl Threshold {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn breach(&self, value: f64) -> Option<Breach> {
        if value < self.min {
            Some(Breach::Low)
        } else if value > self.max {
            Some(Breach::High)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Breach {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Degrees Celsius.
    pub temperature: Threshold,
    /// Relative humidity, percent.
    pub humidity: Threshold,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            temperature: Threshold::new(15.0, 35.0),
            humidity: Threshold::new(30.0, 80.0),
        }
    }
}

/// One sample from the orchard sensors. Absent fields are not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub motion_detected: Option<bool>,
    #[serde(default)]
    pub intrusion_detected: Option<bool>,
}

/// Latches for one-shot alerts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertState {
    pub motion_alerted: bool,
    pub intrusion_alerted: bool,
}

impl AlertState {
    pub fn reset(&mut self) {
        self.motion_alerted = false;
        self.intrusion_alerted = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Normal,
}

impl Priority {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::High => "URGENT: ",
            Self::Medium => "ALERT: ",
            Self::Normal => "INFO: ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    TemperatureLow,
    TemperatureHigh,
    HumidityLow,
    HumidityHigh,
    Motion,
    Intrusion,
    DailyReport,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TemperatureLow => "temperature_low",
            Self::TemperatureHigh => "temperature_high",
            Self::HumidityLow => "humidity_low",
            Self::HumidityHigh => "humidity_high",
            Self::Motion => "motion",
            Self::Intrusion => "intrusion",
            Self::DailyReport => "daily_report",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub priority: Priority,
    pub message: String,
}

impl Alert {
    fn new(kind: AlertKind, priority: Priority, message: String) -> Self {
        Self {
            kind,
            priority,
            message,
        }
    }

    /// SMS body: priority prefix followed by the message.
    pub fn text(&self) -> String {
        format!("{}{}", self.priority.prefix(), self.message)
    }
}

/// Check `reading` against `thresholds`.
///
/// Temperature below range is medium priority, above range high; humidity out of range is
/// medium either way. Motion and intrusion are high priority and fire once each until
/// `state` is reset.
pub fn evaluate(
    thresholds: &AlertThresholds,
    state: &mut AlertState,
    reading: &SensorReading,
    at: NaiveDateTime,
) -> Vec<Alert> {
    let stamp = at.format(TIMESTAMP_FORMAT);
    let mut alerts = Vec::new();

    if let Some(temp) = reading.temperature {
        match thresholds.temperature.breach(temp) {
            Some(Breach::Low) => alerts.push(Alert::new(
                AlertKind::TemperatureLow,
                Priority::Medium,
                format!("Temperature too low: {temp}°C at {stamp}"),
            )),
            Some(Breach::High) => alerts.push(Alert::new(
                AlertKind::TemperatureHigh,
                Priority::High,
                format!("Temperature too high: {temp}°C at {stamp}"),
            )),
            None => {}
        }
    }

    if let Some(humidity) = reading.humidity {
        match thresholds.humidity.breach(humidity) {
            Some(Breach::Low) => alerts.push(Alert::new(
                AlertKind::HumidityLow,
                Priority::Medium,
                format!("Humidity too low: {humidity}% at {stamp}"),
            )),
            Some(Breach::High) => alerts.push(Alert::new(
                AlertKind::HumidityHigh,
                Priority::Medium,
                format!("Humidity too high: {humidity}% at {stamp}"),
            )),
            None => {}
        }
    }

    if reading.motion_detected == Some(true) && !state.motion_alerted {
        state.motion_alerted = true;
        alerts.push(Alert::new(
            AlertKind::Motion,
            Priority::High,
            format!("Motion detected in orchard at {stamp}"),
        ));
    }

    if reading.intrusion_detected == Some(true) && !state.intrusion_alerted {
        state.intrusion_alerted = true;
        alerts.push(Alert::new(
            AlertKind::Intrusion,
            Priority::High,
            format!("INTRUSION DETECTED in orchard at {stamp}!"),
        ));
    }

    alerts
}

pub fn daily_report(date: NaiveDate) -> Alert {
    Alert::new(
        AlertKind::DailyReport,
        Priority::Normal,
        format!(
            "Daily FruitGuard Report - {}\nAll systems operational. No critical alerts.",
            date.format("%Y-%m-%d")
        ),
    )
}

/// Sends alerts to a fixed recipient list.
#[derive(Clone)]
pub struct AlertNotifier {
    dispatcher: Dispatcher,
    normalizer: Normalizer,
    recipients: Vec<String>,
    sender: Option<SenderId>,
}

impl AlertNotifier {
    pub fn new(dispatcher: Dispatcher, normalizer: Normalizer) -> Self {
        Self {
            dispatcher,
            normalizer,
            recipients: Vec::new(),
            sender: None,
        }
    }

    /// Add a raw recipient; it is normalized on every send.
    pub fn add_recipient(&mut self, number: impl Into<String>) {
        self.recipients.push(number.into());
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Sender for alerts; the dispatcher default is used when unset.
    pub fn with_sender(mut self, sender: SenderId) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Send one alert to every recipient in a single request.
    ///
    /// Returns `Ok(None)` without contacting the provider when no recipients are configured.
    pub async fn notify(&self, alert: &Alert) -> Result<Option<SendSmsResponse>, DispatchError> {
        if self.recipients.is_empty() {
            info!(kind = %alert.kind, "no alert recipients configured");
            return Ok(None);
        }

        let normalized = self.normalizer.format(&self.recipients);
        if !normalized.rejected.is_empty() {
            warn!(
                kind = %alert.kind,
                rejected = normalized.rejected.len(),
                "skipping invalid alert recipients"
            );
        }
        let recipients = normalized.into_accepted()?;

        let options = SendOptions {
            sender: self.sender.clone(),
            ..SendOptions::default()
        };
        let request = SendSms::new(recipients, MessageText::new(alert.text())?, options)?;
        let response = self.dispatcher.send_sms(request).await?;
        info!(kind = %alert.kind, attempts = response.attempts, "alert sent");
        Ok(Some(response))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dispatcher::Credentials;
    use crate::dispatcher::fake::{FakeTransport, Scripted};
    use crate::domain::ValidationError;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(6, 30, 0)
            .unwrap()
    }

    fn reading() -> SensorReading {
        SensorReading::default()
    }

    #[test]
    fn readings_within_range_raise_nothing() {
        let mut state = AlertState::default();
        let reading = SensorReading {
            temperature: Some(25.0),
            humidity: Some(60.0),
            ..reading()
        };
        assert!(evaluate(&AlertThresholds::default(), &mut state, &reading, at()).is_empty());

        let boundary = SensorReading {
            temperature: Some(35.0),
            humidity: Some(30.0),
            ..self::reading()
        };
        assert!(evaluate(&AlertThresholds::default(), &mut state, &boundary, at()).is_empty());
    }

    #[test]
    fn temperature_breaches_have_direction_specific_priority() {
        let mut state = AlertState::default();
        let thresholds = AlertThresholds::default();

        let cold = SensorReading {
            temperature: Some(10.0),
            ..reading()
        };
        let alerts = evaluate(&thresholds, &mut state, &cold, at());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::TemperatureLow);
        assert_eq!(alerts[0].priority, Priority::Medium);
        assert_eq!(
            alerts[0].text(),
            "ALERT: Temperature too low: 10°C at 2025-03-14 06:30:00"
        );

        let hot = SensorReading {
            temperature: Some(42.5),
            ..reading()
        };
        let alerts = evaluate(&thresholds, &mut state, &hot, at());
        assert_eq!(alerts[0].kind, AlertKind::TemperatureHigh);
        assert_eq!(alerts[0].priority, Priority::High);
        assert!(alerts[0].text().starts_with("URGENT: Temperature too high: 42.5°C"));
    }

    #[test]
    fn humidity_breaches_are_medium_either_way() {
        let mut state = AlertState::default();
        let thresholds = AlertThresholds {
            humidity: Threshold::new(25.0, 85.0),
            ..AlertThresholds::default()
        };

        let dry = SensorReading {
            humidity: Some(20.0),
            ..reading()
        };
        let wet = SensorReading {
            humidity: Some(90.0),
            ..reading()
        };
        let alerts: Vec<Alert> = [dry, wet]
            .iter()
            .flat_map(|r| evaluate(&thresholds, &mut state, r, at()))
            .collect();

        assert_eq!(
            alerts.iter().map(|a| a.kind).collect::<Vec<_>>(),
            vec![AlertKind::HumidityLow, AlertKind::HumidityHigh]
        );
        assert!(alerts.iter().all(|a| a.priority == Priority::Medium));
    }

    #[test]
    fn motion_and_intrusion_fire_once_until_reset() {
        let mut state = AlertState::default();
        let thresholds = AlertThresholds::default();
        let reading = SensorReading {
            motion_detected: Some(true),
            intrusion_detected: Some(true),
            ..reading()
        };

        let first = evaluate(&thresholds, &mut state, &reading, at());
        assert_eq!(
            first.iter().map(|a| a.kind).collect::<Vec<_>>(),
            vec![AlertKind::Motion, AlertKind::Intrusion]
        );
        assert_eq!(
            first[1].text(),
            "URGENT: INTRUSION DETECTED in orchard at 2025-03-14 06:30:00!"
        );

        assert!(evaluate(&thresholds, &mut state, &reading, at()).is_empty());

        state.reset();
        assert_eq!(evaluate(&thresholds, &mut state, &reading, at()).len(), 2);
    }

    #[test]
    fn false_motion_flag_does_not_latch() {
        let mut state = AlertState::default();
        let reading = SensorReading {
            motion_detected: Some(false),
            ..reading()
        };
        assert!(evaluate(&AlertThresholds::default(), &mut state, &reading, at()).is_empty());
        assert!(!state.motion_alerted);
    }

    #[test]
    fn readings_deserialize_with_missing_fields() {
        let reading: SensorReading =
            serde_json::from_str(r#"{"temperature": 28, "motion_detected": true}"#).unwrap();
        assert_eq!(reading.temperature, Some(28.0));
        assert_eq!(reading.humidity, None);
        assert_eq!(reading.motion_detected, Some(true));
    }

    #[test]
    fn daily_report_is_informational() {
        let report = daily_report(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        assert_eq!(report.kind, AlertKind::DailyReport);
        assert_eq!(
            report.text(),
            "INFO: Daily FruitGuard Report - 2025-03-14\nAll systems operational. No critical alerts."
        );
    }

    fn notifier(transport: FakeTransport) -> AlertNotifier {
        let dispatcher = Dispatcher::builder()
            .credentials(Credentials::new("key", "secret").ok())
            .base_url("https://example.invalid/v1")
            .max_retries(0)
            .retry_delay(Duration::ZERO)
            .transport(transport)
            .build()
            .unwrap();
        AlertNotifier::new(dispatcher, Normalizer::default())
    }

    #[tokio::test]
    async fn notifier_without_recipients_sends_nothing() {
        let transport = FakeTransport::always(Scripted::Status(200, "{}"));
        let notifier = notifier(transport.clone());

        let sent = notifier
            .notify(&daily_report(at().date()))
            .await
            .unwrap();
        assert!(sent.is_none());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn notifier_sends_prefixed_text_to_normalized_recipients() {
        let transport =
            FakeTransport::always(Scripted::Status(200, r#"{ "message_id": "alert-1" }"#));
        let mut notifier =
            notifier(transport.clone()).with_sender(SenderId::new("ORCHARD").unwrap());
        notifier.add_recipient("0712345678");
        notifier.add_recipient("not a number");
        notifier.add_recipient("+254112345678");

        let alert = Alert::new(AlertKind::Motion, Priority::High, "Motion".to_owned());
        let sent = notifier.notify(&alert).await.unwrap().unwrap();
        assert_eq!(sent.message_id.unwrap().as_str(), "alert-1");

        let body = transport.calls()[0].body.clone().unwrap();
        assert_eq!(body["message"], "URGENT: Motion");
        assert_eq!(body["source"], "ORCHARD");
        assert_eq!(
            body["destination"],
            serde_json::json!([{ "number": "+254712345678" }, { "number": "+254112345678" }])
        );
    }

    #[tokio::test]
    async fn notifier_fails_when_no_recipient_is_valid() {
        let transport = FakeTransport::always(Scripted::Status(200, "{}"));
        let mut notifier = notifier(transport.clone());
        notifier.add_recipient("garbage");

        let err = notifier
            .notify(&daily_report(at().date()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Validation(ValidationError::NoValidPhoneNumbers { .. })
        ));
        assert!(transport.calls().is_empty());
    }
}
