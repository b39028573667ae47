/// A value that knows how to write itself to an [`Encoder`].
pub trait ToCbor {
    fn to_cbor(&self, encoder: &mut Encoder);
}

/// An append-only CBOR writer.
#[derive(Default)]
pub struct Encoder {
    data: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn emit_uint_minor(&mut self, major: u8, val: u64) {
        // Shortest-form argument: an immediate below 24, otherwise the
        // smallest of 1, 2, 4 or 8 big-endian bytes under minor codes 24..=27
        if val < 24 {
            self.data.push((major << 5) | val as u8);
            return;
        }
        let width = (8 - val.leading_zeros() as usize / 8).next_power_of_two();
        self.data
            .push((major << 5) | (24 + width.trailing_zeros() as u8));
        self.data.extend_from_slice(&val.to_be_bytes()[8 - width..]);
    }

    /// Append pre-encoded CBOR verbatim.
    pub fn emit_raw(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
    }

    pub fn emit<T>(&mut self, value: &T)
    where
        T: ToCbor + ?Sized,
    {
        value.to_cbor(self)
    }

    /// Emit an array, definite-length if `count` is given, indefinite-length
    /// otherwise.
    pub fn emit_array<F>(&mut self, count: Option<usize>, f: F)
    where
        F: FnOnce(&mut Array),
    {
        let mut a = Array::new(self, count);
        f(&mut a);
        a.end()
    }

    pub fn emit_map<F>(&mut self, count: Option<usize>, f: F)
    where
        F: FnOnce(&mut Map),
    {
        let mut m = Map::new(self, count);
        f(&mut m);
        m.end()
    }

    /// The number of bytes written so far.
    pub fn offset(&self) -> usize {
        self.data.len()
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

/// A definite- or indefinite-length array or map under construction.
///
/// Definite-length sequences declare their item count up front; emitting a
/// different number of items is a logic error and panics.
pub struct Sequence<'a, const D: usize> {
    encoder: &'a mut Encoder,
    count: Option<usize>,
    idx: usize,
}

pub type Array<'a> = Sequence<'a, 1>;
pub type Map<'a> = Sequence<'a, 2>;

impl<'a, const D: usize> Sequence<'a, D> {
    fn new(encoder: &'a mut Encoder, count: Option<usize>) -> Self {
        let major = if D == 1 { 4 } else { 5 };
        if let Some(count) = count {
            encoder.emit_uint_minor(major, count as u64);
        } else {
            encoder.data.push((major << 5) | 31);
        }
        Self {
            encoder,
            count: count.map(|c| c * D),
            idx: 0,
        }
    }

    fn check_bounds(&mut self) {
        self.idx += 1;
        if let Some(count) = self.count {
            if self.idx > count {
                panic!("Too many items added to definite-length sequence");
            }
        }
    }

    fn end(self) {
        match self.count {
            Some(count) => {
                if self.idx != count {
                    panic!(
                        "Definite-length sequence is short of items: {}, expected {}",
                        self.idx, count
                    );
                }
            }
            None => self.encoder.data.push(0xFF),
        }
    }

    /// Account for an item without writing it.
    ///
    /// The caller takes on the obligation to append the missing value to the
    /// built buffer itself; until then the sequence is not valid CBOR.
    pub fn skip_value(&mut self) {
        self.check_bounds()
    }

    pub fn emit_raw(&mut self, data: &[u8]) {
        self.check_bounds();
        self.encoder.emit_raw(data)
    }

    pub fn emit<T>(&mut self, value: &T)
    where
        T: ToCbor + ?Sized,
    {
        self.check_bounds();
        self.encoder.emit(value)
    }

    pub fn emit_array<F>(&mut self, count: Option<usize>, f: F)
    where
        F: FnOnce(&mut Array),
    {
        self.check_bounds();
        self.encoder.emit_array(count, f)
    }

    pub fn emit_map<F>(&mut self, count: Option<usize>, f: F)
    where
        F: FnOnce(&mut Map),
    {
        self.check_bounds();
        self.encoder.emit_map(count, f)
    }

    pub fn offset(&self) -> usize {
        self.encoder.offset()
    }
}

/// Wrapper emitting a byte slice as a CBOR byte string.
///
/// Bare `[u8]` slices encode as arrays of integers like any other slice;
/// byte strings must be asked for explicitly.
pub struct Bytes<'a>(pub &'a [u8]);

impl ToCbor for Bytes<'_> {
    fn to_cbor(&self, encoder: &mut Encoder) {
        encoder.emit_uint_minor(2, self.0.len() as u64);
        encoder.data.extend_from_slice(self.0);
    }
}

macro_rules! uint_to_cbor {
    ($($t:ty),*) => {
        $(impl ToCbor for $t {
            fn to_cbor(&self, encoder: &mut Encoder) {
                encoder.emit_uint_minor(0, *self as u64)
            }
        })*
    };
}

uint_to_cbor!(u8, u16, u32, u64, usize);

fn emit_i64(encoder: &mut Encoder, val: i64) {
    if val >= 0 {
        encoder.emit_uint_minor(0, val as u64)
    } else {
        encoder.emit_uint_minor(1, val.unsigned_abs() - 1)
    }
}

macro_rules! int_to_cbor {
    ($($t:ty),*) => {
        $(impl ToCbor for $t {
            fn to_cbor(&self, encoder: &mut Encoder) {
                emit_i64(encoder, *self as i64)
            }
        })*
    };
}

int_to_cbor!(i8, i16, i32, i64, isize);

impl ToCbor for bool {
    fn to_cbor(&self, encoder: &mut Encoder) {
        encoder.data.push((7 << 5) | if *self { 21 } else { 20 });
    }
}

impl ToCbor for half::f16 {
    fn to_cbor(&self, encoder: &mut Encoder) {
        encoder.data.push((7 << 5) | 25);
        encoder.data.extend(self.to_be_bytes());
    }
}

impl ToCbor for f32 {
    fn to_cbor(&self, encoder: &mut Encoder) {
        let h = half::f16::from_f32(*self);
        if f32::from(h) == *self || self.is_nan() {
            h.to_cbor(encoder)
        } else {
            encoder.data.push((7 << 5) | 26);
            encoder.data.extend(self.to_be_bytes());
        }
    }
}

impl ToCbor for f64 {
    fn to_cbor(&self, encoder: &mut Encoder) {
        let f = *self as f32;
        if f64::from(f) == *self || self.is_nan() {
            f.to_cbor(encoder)
        } else {
            encoder.data.push((7 << 5) | 27);
            encoder.data.extend(self.to_be_bytes());
        }
    }
}

impl ToCbor for str {
    fn to_cbor(&self, encoder: &mut Encoder) {
        encoder.emit_uint_minor(3, self.len() as u64);
        encoder.data.extend(self.as_bytes());
    }
}

impl ToCbor for String {
    fn to_cbor(&self, encoder: &mut Encoder) {
        self.as_str().to_cbor(encoder)
    }
}

impl<T: ToCbor> ToCbor for [T] {
    fn to_cbor(&self, encoder: &mut Encoder) {
        encoder.emit_array(Some(self.len()), |a| {
            for item in self {
                a.emit(item);
            }
        })
    }
}

impl<T: ToCbor> ToCbor for Vec<T> {
    fn to_cbor(&self, encoder: &mut Encoder) {
        self.as_slice().to_cbor(encoder)
    }
}

impl<T: ToCbor, const N: usize> ToCbor for [T; N] {
    fn to_cbor(&self, encoder: &mut Encoder) {
        self.as_slice().to_cbor(encoder)
    }
}

impl<A: ToCbor, B: ToCbor> ToCbor for (A, B) {
    fn to_cbor(&self, encoder: &mut Encoder) {
        encoder.emit_array(Some(2), |a| {
            a.emit(&self.0);
            a.emit(&self.1);
        })
    }
}

impl<T: ToCbor + ?Sized> ToCbor for &T {
    fn to_cbor(&self, encoder: &mut Encoder) {
        T::to_cbor(self, encoder)
    }
}

pub fn emit<T>(value: &T) -> Vec<u8>
where
    T: ToCbor + ?Sized,
{
    let mut e = Encoder::default();
    e.emit(value);
    e.build()
}

pub fn emit_array<F>(count: Option<usize>, f: F) -> Vec<u8>
where
    F: FnOnce(&mut Array),
{
    let mut e = Encoder::default();
    e.emit_array(count, f);
    e.build()
}

pub fn emit_map<F>(count: Option<usize>, f: F) -> Vec<u8>
where
    F: FnOnce(&mut Map),
{
    let mut e = Encoder::default();
    e.emit_map(count, f);
    e.build()
}
