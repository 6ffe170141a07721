//! DSD to PCM decimation.
//!
//! Converts 1-bit Direct Stream Digital input to floating point PCM at
//! one eighth of the bit rate (eight DSD bits per output sample). The
//! filter is a 96-tap symmetric FIR evaluated one byte at a time through
//! six 256-entry lookup tables, so each output sample costs twelve table
//! reads instead of 96 multiplies.
//!
//! [`DsdFifo`] is the single-channel engine; [`DsdDecoder`] fans it out
//! over the channels of an interleaved stream and applies makeup gain.

use std::sync::OnceLock;

/// Half of the symmetric 96-tap decimation filter.
static HTAPS: [f64; 48] = [
    0.09950731974056658,
    0.09562845727714668,
    0.08819647126516944,
    0.07782552527068175,
    0.06534876523171299,
    0.05172629311427257,
    0.0379429484910187,
    0.02490921351762261,
    0.0133774746265897,
    0.003883043418804416,
    -0.003284703416210726,
    -0.008080250212687497,
    -0.01067241812471033,
    -0.01139427235000863,
    -0.0106813877974587,
    -0.009007905078766049,
    -0.008591625008276668,
    -0.005955702212592135,
    -0.003378599020635682,
    -0.001125104186400862,
    0.0006403591297955402,
    0.0018492998113383292,
    0.0025145547669342037,
    0.0027092056278338267,
    0.002542914211966164,
    0.002139204996181095,
    0.0016164214447051896,
    0.0010740395764754038,
    0.0005849337717953497,
    0.0001932283662158641,
    -0.0000833433658259547,
    -0.0002480524175390096,
    -0.00031832926523582317,
    -0.0003188604327467048,
    -0.0002756775916972923,
    -0.00021186015163762476,
    -0.00014504927453575227,
    -0.00008662417511852786,
    -0.000042160754766910744,
    -0.000012688790084422468,
    0.0000037272966205330953,
    0.000010468820215443933,
    0.000011155821360559008,
    0.000008864422133692581,
    0.0000057624940875088895,
    0.0000030781160169881883,
    0.0000012785470254029367,
    0.0000003379048571476997,
];

/// Number of byte-wide lookup tables, one per 8 taps of the half filter.
const CTABLES: usize = 6;
const FIFOSIZE: usize = 16;
const FIFOMASK: usize = FIFOSIZE - 1;

/// DSD silence pattern.
const SILENCE: u8 = 0x69;

/// +6 dB makeup for the roughly half-scale level of DSD program material.
pub const GAIN_6DB: f32 = 1.995_262_3;

struct Tables {
    ctables: [[f32; 256]; CTABLES],
    bit_reverse: [u8; 256],
}

impl Tables {
    fn build() -> Self {
        let mut ctables = [[0.0f32; 256]; CTABLES];
        for t in 0..CTABLES {
            for e in 0..256usize {
                let mut acc = 0.0f64;
                for (m, &tap) in HTAPS[t * 8..t * 8 + 8].iter().enumerate() {
                    let sign = ((e >> (7 - m)) & 1) as f64 * 2.0 - 1.0;
                    acc += sign * tap;
                }
                ctables[CTABLES - 1 - t][e] = acc as f32;
            }
        }
        let mut bit_reverse = [0u8; 256];
        for (e, slot) in bit_reverse.iter_mut().enumerate() {
            *slot = (e as u8).reverse_bits();
        }
        Self {
            ctables,
            bit_reverse,
        }
    }
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(Tables::build)
}

/// Single-channel DSD decimation state: a ring of the last sixteen input
/// octets plus the write cursor.
///
/// Octets older than [`CTABLES`] positions sit in the ring bit-reversed,
/// which lets the second half of the symmetric filter reuse the same six
/// lookup tables as the first.
#[derive(Debug, Clone)]
pub struct DsdFifo {
    fifo: [u8; FIFOSIZE],
    pos: usize,
}

impl Default for DsdFifo {
    fn default() -> Self {
        Self::new()
    }
}

impl DsdFifo {
    pub fn new() -> Self {
        Self {
            fifo: [SILENCE; FIFOSIZE],
            pos: 0,
        }
    }

    /// Drop accumulated history, as if the stream restarted from silence.
    pub fn reset(&mut self) {
        self.fifo = [SILENCE; FIFOSIZE];
        self.pos = 0;
    }

    /// Decimate `samples` output samples worth of input (one octet each).
    ///
    /// Reads `src[i * src_stride]` and writes `dst[i * dst_stride]`, so an
    /// interleaved multichannel buffer can be processed with the channel
    /// count as the stride. `lsb_first` flips octets whose oldest bit is
    /// the least significant one.
    pub fn translate(
        &mut self,
        samples: usize,
        src: &[u8],
        src_stride: usize,
        lsb_first: bool,
        dst: &mut [f32],
        dst_stride: usize,
    ) {
        if samples == 0 {
            return;
        }
        assert!(src.len() > (samples - 1) * src_stride, "src too short");
        assert!(dst.len() > (samples - 1) * dst_stride, "dst too short");

        let tables = tables();
        let mut pos = self.pos;
        for n in 0..samples {
            let mut octet = src[n * src_stride];
            if lsb_first {
                octet = tables.bit_reverse[octet as usize];
            }
            self.fifo[pos] = octet;

            // Flip the octet leaving the first filter half so the mirrored
            // tables apply to it from now on.
            let turn = (pos + FIFOSIZE - CTABLES) & FIFOMASK;
            self.fifo[turn] = tables.bit_reverse[self.fifo[turn] as usize];

            let mut acc = 0.0f32;
            for (i, ctable) in tables.ctables.iter().enumerate() {
                let young = self.fifo[(pos + FIFOSIZE - i) & FIFOMASK];
                let old = self.fifo[(pos + FIFOSIZE - (2 * CTABLES - 1) + i) & FIFOMASK];
                acc += ctable[young as usize] + ctable[old as usize];
            }
            dst[n * dst_stride] = acc;

            pos = (pos + 1) & FIFOMASK;
        }
        self.pos = pos;
    }
}

/// Multichannel DSD front end: one [`DsdFifo`] per channel plus output
/// gain.
pub struct DsdDecoder {
    filters: Vec<DsdFifo>,
    gain: f32,
}

impl DsdDecoder {
    pub fn new(channels: usize) -> Self {
        Self::with_gain(channels, GAIN_6DB)
    }

    pub fn with_gain(channels: usize, gain: f32) -> Self {
        Self {
            filters: vec![DsdFifo::new(); channels],
            gain,
        }
    }

    pub fn channels(&self) -> usize {
        self.filters.len()
    }

    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }

    /// Decimate a channel-interleaved octet buffer into interleaved PCM.
    ///
    /// `src.len()` must be a multiple of the channel count and `dst` must
    /// hold exactly one f32 per input octet.
    pub fn process_interleaved(&mut self, src: &[u8], lsb_first: bool, dst: &mut [f32]) {
        let channels = self.filters.len();
        assert_eq!(src.len() % channels, 0, "partial input frame");
        assert_eq!(dst.len(), src.len(), "output buffer size mismatch");

        let samples = src.len() / channels;
        for (ch, filter) in self.filters.iter_mut().enumerate() {
            filter.translate(
                samples,
                &src[ch..],
                channels,
                lsb_first,
                &mut dst[ch..],
                channels,
            );
        }
        for sample in dst.iter_mut() {
            *sample *= self.gain;
        }
    }
}
