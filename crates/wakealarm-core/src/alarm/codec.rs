//! Fixed-layout binary encoding of an alarm, for handing a complete alarm
//! between processes and for `export`/`import`.
//!
//! Layout (big-endian): a version byte, then every field in declaration
//! order. Booleans are one byte, strings a `u32` byte length followed by
//! UTF-8 bytes, the day set its bitmask byte and the media type its code.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::{Alarm, MediaType};
use crate::calendar::DaySet;
use crate::error::CodecError;

pub const VERSION: u8 = 1;

pub fn encode(alarm: &Alarm) -> Vec<u8> {
    let mut w = Writer(Vec::with_capacity(128));
    w.u8(VERSION);
    w.i64(alarm.id);
    w.bool(alarm.is_enabled);
    w.bool(alarm.is_active);
    w.i64(alarm.time_active);
    w.u32(alarm.snooze_count);
    w.u32(alarm.hour);
    w.u32(alarm.minute);
    w.i32(alarm.snooze_hour);
    w.i32(alarm.snooze_minute);
    w.u8(alarm.days.value());
    w.bool(alarm.repeat);
    w.bool(alarm.vibrate);
    w.bool(alarm.use_nfc);
    w.str(&alarm.nfc_tag_id);
    w.u8(alarm.media_type.code());
    w.str(&alarm.media_path);
    w.str(&alarm.media_title);
    w.u32(alarm.volume);
    w.str(&alarm.audio_source);
    w.str(&alarm.name);
    w.bool(alarm.use_tts);
    w.u32(alarm.tts_frequency);
    w.bool(alarm.use_dismiss_early);
    w.u32(alarm.dismiss_early_time);
    w.i64(alarm.time_of_dismiss_early_alarm);
    w.0
}

pub fn decode(bytes: &[u8]) -> Result<Alarm, CodecError> {
    let mut r = Reader { bytes, pos: 0 };
    let version = r.u8()?;
    if version != VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let alarm = Alarm {
        id: r.i64()?,
        is_enabled: r.bool()?,
        is_active: r.bool()?,
        time_active: r.i64()?,
        snooze_count: r.u32()?,
        hour: r.u32()?,
        minute: r.u32()?,
        snooze_hour: r.i32()?,
        snooze_minute: r.i32()?,
        days: DaySet::from_value(r.u8()?),
        repeat: r.bool()?,
        vibrate: r.bool()?,
        use_nfc: r.bool()?,
        nfc_tag_id: r.string("nfc_tag_id")?,
        media_type: MediaType::from_code(r.u8()?),
        media_path: r.string("media_path")?,
        media_title: r.string("media_title")?,
        volume: r.u32()?,
        audio_source: r.string("audio_source")?,
        name: r.string("name")?,
        use_tts: r.bool()?,
        tts_frequency: r.u32()?,
        use_dismiss_early: r.bool()?,
        dismiss_early_time: r.u32()?,
        time_of_dismiss_early_alarm: r.i64()?,
    };
    let rest = bytes.len() - r.pos;
    if rest != 0 {
        return Err(CodecError::TrailingBytes(rest));
    }
    Ok(alarm)
}

/// Base64 text form of [`encode`].
pub fn encode_text(alarm: &Alarm) -> String {
    STANDARD.encode(encode(alarm))
}

pub fn decode_text(text: &str) -> Result<Alarm, CodecError> {
    let bytes = STANDARD.decode(text.trim())?;
    decode(&bytes)
}

struct Writer(Vec<u8>);

impl Writer {
    fn u8(&mut self, v: u8) {
        self.0.push(v);
    }

    fn bool(&mut self, v: bool) {
        self.0.push(u8::from(v));
    }

    fn u32(&mut self, v: u32) {
        self.0.extend_from_slice(&v.to_be_bytes());
    }

    fn i32(&mut self, v: i32) {
        self.0.extend_from_slice(&v.to_be_bytes());
    }

    fn i64(&mut self, v: i64) {
        self.0.extend_from_slice(&v.to_be_bytes());
    }

    fn str(&mut self, v: &str) {
        self.u32(v.len() as u32);
        self.0.extend_from_slice(v.as_bytes());
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let available = self.bytes.len() - self.pos;
        if available < n {
            return Err(CodecError::Truncated {
                offset: self.pos,
                needed: n - available,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.u8()? != 0)
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    fn string(&mut self, field: &'static str) -> Result<String, CodecError> {
        let len = self.u32()? as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Day;

    fn sample() -> Alarm {
        Alarm {
            id: 42,
            is_active: true,
            time_active: 90_000,
            snooze_count: 2,
            hour: 6,
            minute: 45,
            snooze_hour: 7,
            snooze_minute: 5,
            days: [Day::Monday, Day::Friday].into_iter().collect(),
            use_nfc: true,
            nfc_tag_id: "04:A2:19".into(),
            media_type: MediaType::File,
            media_path: "/music/sunrise.ogg".into(),
            media_title: "Sunrise".into(),
            volume: 80,
            name: "Früh\nstart".into(),
            use_tts: true,
            tts_frequency: 3,
            ..Alarm::default()
        }
    }

    #[test]
    fn text_form_restores_every_field() {
        let alarm = sample();
        assert_eq!(decode_text(&encode_text(&alarm)).unwrap(), alarm);
    }

    #[test]
    fn version_byte_comes_first() {
        assert_eq!(encode(&sample())[0], VERSION);
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = encode(&sample());
        bytes[0] = 9;
        assert_eq!(decode(&bytes), Err(CodecError::UnsupportedVersion(9)));
    }

    #[test]
    fn rejects_truncated_input() {
        let bytes = encode(&sample());
        let err = decode(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { needed: 3, .. }));
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = encode(&sample());
        bytes.extend_from_slice(&[0, 0]);
        assert_eq!(decode(&bytes), Err(CodecError::TrailingBytes(2)));
    }

    #[test]
    fn rejects_bad_base64() {
        assert!(matches!(decode_text("not base64!"), Err(CodecError::Base64(_))));
    }
}
