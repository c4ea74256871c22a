//! TTML time expressions.
//!
//! Supports the forms found in EBU-TTML-live `begin`/`end` attributes:
//! - clock time `HH:MM:SS`, `HH:MM:SS:FF` and `HH:MM:SS:FF.sf` (sub-frames)
//! - clock time with a fraction `HH:MM:SS.fff` (kept as an offset in seconds)
//! - offset time `<number><unit>` with unit `h`, `m`, `s`, `ms`, `f` or `t`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Unit of an offset time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
    Frames,
    Ticks,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Hours => "h",
            TimeUnit::Minutes => "m",
            TimeUnit::Seconds => "s",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Frames => "f",
            TimeUnit::Ticks => "t",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frame component of a clock time: whole frames plus optional sub-frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frames {
    pub frames: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_frames: Option<u16>,
}

impl Frames {
    pub fn new(frames: u16) -> Self {
        Self {
            frames,
            sub_frames: None,
        }
    }

    pub fn with_sub_frames(mut self, sub_frames: u16) -> Self {
        self.sub_frames = Some(sub_frames);
        self
    }

    /// Duration in seconds at the given timing parameters.
    fn to_seconds(self, timing: &TimingParameters) -> f64 {
        let frame_rate = timing.frame_rate.max(f32::EPSILON) as f64;
        let sub_frame_rate = timing.sub_frame_rate.max(1) as f64;
        let sub_frames = self.sub_frames.unwrap_or(0) as f64;
        self.frames as f64 / frame_rate + sub_frames / (frame_rate * sub_frame_rate)
    }
}

/// Document-level timing attributes (`ttp:frameRate`, `ttp:subFrameRate`, `ttp:tickRate`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingParameters {
    pub frame_rate: f32,
    pub sub_frame_rate: u32,
    pub tick_rate: f32,
}

impl Default for TimingParameters {
    fn default() -> Self {
        Self {
            frame_rate: 30.0,
            sub_frame_rate: 1,
            tick_rate: 1.0,
        }
    }
}

/// A parsed TTML time expression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TimeExpression {
    ClockTime {
        hours: u16,
        minutes: u8,
        seconds: u8,
        frames: Frames,
    },
    OffsetTime {
        offset: f32,
        unit: TimeUnit,
    },
}

impl TimeExpression {
    /// Duration from the document origin, in seconds.
    pub fn to_seconds(&self, timing: &TimingParameters) -> f64 {
        match *self {
            TimeExpression::ClockTime {
                hours,
                minutes,
                seconds,
                frames,
            } => {
                let base = hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds as f64;
                base + frames.to_seconds(timing)
            }
            TimeExpression::OffsetTime { offset, unit } => {
                let offset = offset as f64;
                match unit {
                    TimeUnit::Hours => offset * 3600.0,
                    TimeUnit::Minutes => offset * 60.0,
                    TimeUnit::Seconds => offset,
                    TimeUnit::Milliseconds => offset / 1000.0,
                    TimeUnit::Frames => offset / timing.frame_rate.max(f32::EPSILON) as f64,
                    TimeUnit::Ticks => offset / timing.tick_rate.max(f32::EPSILON) as f64,
                }
            }
        }
    }

    /// Format as an `HH:MM:SS:FF` timecode. Sub-frames are dropped.
    pub fn to_timecode(&self, timing: &TimingParameters) -> String {
        if let TimeExpression::ClockTime {
            hours,
            minutes,
            seconds,
            frames,
        } = *self
        {
            return format!(
                "{:02}:{:02}:{:02}:{:02}",
                hours, minutes, seconds, frames.frames
            );
        }

        let total = self.to_seconds(timing).max(0.0);
        let whole = total.floor();
        let hours = (whole / 3600.0).floor() as u64;
        let minutes = ((whole % 3600.0) / 60.0).floor() as u64;
        let seconds = (whole % 60.0) as u64;
        let frames = ((total - whole) * timing.frame_rate as f64).floor() as u64;
        format!("{:02}:{:02}:{:02}:{:02}", hours, minutes, seconds, frames)
    }
}

impl fmt::Display for TimeExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeExpression::ClockTime {
                hours,
                minutes,
                seconds,
                frames,
            } => {
                write!(
                    f,
                    "{:02}:{:02}:{:02}:{:02}",
                    hours, minutes, seconds, frames.frames
                )?;
                if let Some(sub_frames) = frames.sub_frames {
                    write!(f, ".{}", sub_frames)?;
                }
                Ok(())
            }
            TimeExpression::OffsetTime { offset, unit } => write!(f, "{}{}", offset, unit),
        }
    }
}

impl FromStr for TimeExpression {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ModelError::InvalidTimeExpression(s.to_string());

        if s.contains(':') {
            return parse_clock_time(s).ok_or_else(invalid);
        }

        // "ms" must be tested before "m" and "s"
        let (number, unit) = if let Some(n) = s.strip_suffix("ms") {
            (n, TimeUnit::Milliseconds)
        } else if let Some(n) = s.strip_suffix('h') {
            (n, TimeUnit::Hours)
        } else if let Some(n) = s.strip_suffix('m') {
            (n, TimeUnit::Minutes)
        } else if let Some(n) = s.strip_suffix('s') {
            (n, TimeUnit::Seconds)
        } else if let Some(n) = s.strip_suffix('f') {
            (n, TimeUnit::Frames)
        } else if let Some(n) = s.strip_suffix('t') {
            (n, TimeUnit::Ticks)
        } else {
            return Err(invalid());
        };

        let offset: f32 = number.parse().map_err(|_| invalid())?;
        if !offset.is_finite() || offset < 0.0 {
            return Err(invalid());
        }
        Ok(TimeExpression::OffsetTime { offset, unit })
    }
}

fn parse_clock_time(s: &str) -> Option<TimeExpression> {
    let parts: Vec<&str> = s.split(':').collect();
    match parts.len() {
        3 => {
            let hours: u16 = parts[0].parse().ok()?;
            let minutes: u8 = parts[1].parse().ok()?;
            if minutes >= 60 {
                return None;
            }
            if parts[2].contains('.') {
                let seconds: f32 = parts[2].parse().ok()?;
                if !(0.0..60.0).contains(&seconds) {
                    return None;
                }
                let offset = hours as f32 * 3600.0 + minutes as f32 * 60.0 + seconds;
                return Some(TimeExpression::OffsetTime {
                    offset,
                    unit: TimeUnit::Seconds,
                });
            }
            let seconds: u8 = parts[2].parse().ok()?;
            if seconds >= 60 {
                return None;
            }
            Some(TimeExpression::ClockTime {
                hours,
                minutes,
                seconds,
                frames: Frames::default(),
            })
        }
        4 => {
            let hours: u16 = parts[0].parse().ok()?;
            let minutes: u8 = parts[1].parse().ok()?;
            let seconds: u8 = parts[2].parse().ok()?;
            if minutes >= 60 || seconds >= 60 {
                return None;
            }
            let frames = match parts[3].split_once('.') {
                Some((frames, sub_frames)) => {
                    Frames::new(frames.parse().ok()?).with_sub_frames(sub_frames.parse().ok()?)
                }
                None => Frames::new(parts[3].parse().ok()?),
            };
            Some(TimeExpression::ClockTime {
                hours,
                minutes,
                seconds,
                frames,
            })
        }
        _ => None,
    }
}
