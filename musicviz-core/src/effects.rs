//! Pure Frame-Berechnung für Rainbow und Visualizer
//!
//! Funktionen ohne Hardware-Dependencies (testbar!)

use rgb::RGB8;
use smart_leds::hsv::{Hsv, hsv2rgb};

/// Ein vom Client geliefertes Beat-Sample (`music:<n>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BeatSample {
    /// Helligkeit 50-255
    pub intensity: u8,
    /// Hue 160-219, bei negativen Beats 101-160
    pub hue: u8,
}

impl BeatSample {
    /// Wandelt einen Beat-Wert (0-100, Überlauf wird begrenzt) in ein Sample
    pub fn from_beat(beat: i32) -> Self {
        Self {
            intensity: map_intensity(beat),
            // Rest mit Vorzeichen: -5 ergibt 155
            hue: (160 + beat % 60) as u8,
        }
    }

    /// Parst die Nutzdaten nach `music:`; nicht-numerisch zählt als 0
    ///
    /// Akzeptiert "42" ebenso wie "42,10,3,1" (erster Wert ist der Beat).
    pub fn parse(data: &str) -> Self {
        let head = data
            .trim()
            .split(|c: char| c == ',' || c.is_ascii_whitespace())
            .next()
            .unwrap_or("");
        let digits_end = head
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
            .map(|(i, _)| i)
            .unwrap_or(head.len());
        let beat = head[..digits_end].parse::<i32>().unwrap_or(0);
        Self::from_beat(beat)
    }
}

/// Beat 0-100 → Intensität 50-255
pub fn map_intensity(beat: i32) -> u8 {
    let beat = beat.clamp(0, 100);
    (50 + beat * 205 / 100) as u8
}

/// Skaliert einen 8-Bit-Wert (255 = 1.0)
#[inline]
pub fn scale8(value: u8, scale: u8) -> u8 {
    ((u16::from(value) * (u16::from(scale) + 1)) >> 8) as u8
}

/// Stückweise lineare Sinus-Näherung, 0-255 → 0-255 (Mitte 128)
pub fn sin8(theta: u8) -> u8 {
    const B_M16_INTERLEAVE: [u8; 8] = [0, 49, 49, 41, 90, 27, 117, 10];

    let mut offset = theta;
    if theta & 0x40 != 0 {
        offset = 255 - offset;
    }
    offset &= 0x3F;

    let mut secoffset = offset & 0x0F;
    if theta & 0x40 != 0 {
        secoffset += 1;
    }

    let section = usize::from(offset >> 4) * 2;
    let b = i16::from(B_M16_INTERLEAVE[section]);
    let m16 = i16::from(B_M16_INTERLEAVE[section + 1]);

    let mx = (m16 * i16::from(secoffset)) >> 4;
    let mut y = mx + b;
    if theta & 0x80 != 0 {
        y = -y;
    }
    (y + 128) as u8
}

/// Sägezahn mit `bpm` Perioden pro Minute
pub fn beat8(bpm: u16, now_ms: u64) -> u8 {
    ((now_ms.wrapping_mul(u64::from(bpm)).wrapping_mul(280)) >> 16) as u8
}

/// Sinus-Welle zwischen `low` und `high` mit `bpm` Perioden pro Minute
pub fn beatsin8(bpm: u16, low: u8, high: u8, now_ms: u64) -> u8 {
    let wave = sin8(beat8(bpm, now_ms));
    low.saturating_add(scale8(wave, high.saturating_sub(low)))
}

/// Füllt den Frame mit einem Regenbogen ab `start_hue`
pub fn fill_rainbow(frame: &mut [RGB8], start_hue: u8, delta_hue: u8) {
    let mut hue = start_hue;
    for pixel in frame.iter_mut() {
        *pixel = hsv2rgb(Hsv {
            hue,
            sat: 255,
            val: 255,
        });
        hue = hue.wrapping_add(delta_hue);
    }
}

/// Visualizer-Demo: wandernde Hues, jede LED pulsiert mit eigener Frequenz
///
/// Mit `sample` wird die Helligkeit durch die Beat-Intensität begrenzt
/// und der Hue zum Sample verschoben.
pub fn visualizer_frame(frame: &mut [RGB8], beat: u8, now_ms: u64, sample: Option<BeatSample>) {
    for (i, pixel) in frame.iter_mut().enumerate() {
        let i = i as u16;
        let wave = beatsin8(60 + i * 2, 0, 255, now_ms);
        let (hue_base, val) = match sample {
            Some(s) => (beat.wrapping_add(s.hue), scale8(wave, s.intensity)),
            None => (beat, wave),
        };
        *pixel = hsv2rgb(Hsv {
            hue: hue_base.wrapping_add((i as u8).wrapping_mul(4)),
            sat: 255,
            val,
        });
    }
}

/// Einfarbiger Beat-Frame direkt nach einem empfangenen Sample
pub fn beat_frame(frame: &mut [RGB8], sample: BeatSample) {
    let color = hsv2rgb(Hsv {
        hue: sample.hue,
        sat: 255,
        val: sample.intensity,
    });
    frame.fill(color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_intensity_range() {
        assert_eq!(map_intensity(-20), 50);
        assert_eq!(map_intensity(0), 50);
        assert_eq!(map_intensity(100), 255);
        assert_eq!(map_intensity(500), 255);
    }

    #[test]
    fn test_beat_sample_parse() {
        assert_eq!(BeatSample::parse("100").intensity, 255);
        assert_eq!(BeatSample::parse("0,5,5").intensity, 50);
        assert_eq!(BeatSample::parse("garbage").intensity, 50);
        assert_eq!(BeatSample::parse("75").hue, 160 + 15);
        assert_eq!(BeatSample::parse("-5").hue, 155);
        assert_eq!(BeatSample::parse("-125").hue, 155);
    }

    #[test]
    fn test_sin8_shape() {
        assert_eq!(sin8(0), 128);
        assert!(sin8(64) > 250);
        assert!(sin8(192) < 5);
    }

    #[test]
    fn test_beatsin8_stays_in_bounds() {
        for t in (0..10_000u64).step_by(37) {
            let v = beatsin8(60, 40, 200, t);
            assert!((40..=200).contains(&v));
        }
    }

    #[test]
    fn test_fill_rainbow_first_pixel_is_start_hue() {
        let mut frame = [RGB8::default(); 4];
        fill_rainbow(&mut frame, 0, 64);
        assert_eq!(
            frame[0],
            hsv2rgb(Hsv {
                hue: 0,
                sat: 255,
                val: 255
            })
        );
        assert_ne!(frame[0], frame[1]);
    }
}
