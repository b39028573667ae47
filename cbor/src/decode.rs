use std::str::Utf8Error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not enough data for encoded value")]
    NotEnoughData,

    #[error("More items to be read")]
    MoreItems,

    #[error("Invalid minor-type value {0}")]
    InvalidMinorValue(u8),

    #[error("Tags with no following value")]
    JustTags,

    #[error("Incorrect type, expecting {0}, found {1}")]
    IncorrectType(String, String),

    #[error("Chunked string contains an invalid chunk")]
    InvalidChunk,

    #[error("Invalid simple type {0}")]
    InvalidSimpleType(u8),

    #[error("Map has key but no value")]
    PartialMap,

    #[error("Maximum recursion depth reached")]
    MaxRecursion,

    #[error(transparent)]
    InvalidUtf8(#[from] Utf8Error),

    #[error(transparent)]
    TryFromIntError(#[from] std::num::TryFromIntError),
}

/// A value that knows how to read itself from CBOR data.
///
/// `from_cbor` parses a single value from the front of `data` and returns it
/// with the number of bytes consumed.
pub trait FromCbor: Sized {
    type Error: From<Error>;

    fn from_cbor(data: &[u8]) -> Result<(Self, usize), Self::Error>;
}

/// A borrowed view of a single decoded value.
pub enum Value<'a, 'b: 'a> {
    UnsignedInteger(u64),
    NegativeInteger(u64),
    Bytes(&'b [u8]),
    ByteStream(Vec<&'b [u8]>),
    Text(&'b str),
    TextStream(Vec<&'b str>),
    Array(&'a mut Array<'b>),
    Map(&'a mut Map<'b>),
    False,
    True,
    Null,
    Undefined,
    Simple(u8),
    Float(f64),
}

impl<'a, 'b: 'a> Value<'a, 'b> {
    pub fn type_name(&self, tagged: bool) -> String {
        let prefix = if tagged { "Tagged " } else { "Untagged " }.to_string();
        match self {
            Value::UnsignedInteger(_) => prefix + "Unsigned Integer",
            Value::NegativeInteger(_) => prefix + "Negative Integer",
            Value::Bytes(_) => prefix + "Definite-length Byte String",
            Value::ByteStream(_) => prefix + "Indefinite-length Byte String",
            Value::Text(_) => prefix + "Definite-length Text String",
            Value::TextStream(_) => prefix + "Indefinite-length Text String",
            Value::Array(_) => prefix + "Array",
            Value::Map(_) => prefix + "Map",
            Value::False => prefix + "False",
            Value::True => prefix + "True",
            Value::Null => prefix + "Null",
            Value::Undefined => prefix + "Undefined",
            Value::Simple(v) => format!("{prefix}Simple Value {v}"),
            Value::Float(_) => prefix + "Float",
        }
    }

    /// Consume the value, recursing into arrays and maps.
    pub fn skip(&mut self, max_recursion: usize) -> Result<(), Error> {
        match self {
            Value::Array(a) => {
                if max_recursion == 0 {
                    return Err(Error::MaxRecursion);
                }
                a.skip_to_end(max_recursion - 1)
            }
            Value::Map(m) => {
                if max_recursion == 0 {
                    return Err(Error::MaxRecursion);
                }
                m.skip_to_end(max_recursion - 1)
            }
            _ => Ok(()),
        }
    }
}

/// A definite- or indefinite-length array or map being read.
///
/// Offsets reported by [`Sequence::offset`] are relative to the start of the
/// slice the containing value was parsed from.
pub struct Sequence<'a, const D: usize> {
    data: &'a [u8],
    count: Option<usize>,
    offset: &'a mut usize,
    idx: usize,
}

pub type Array<'a> = Sequence<'a, 1>;
pub type Map<'a> = Sequence<'a, 2>;

impl<'a, const D: usize> Sequence<'a, D> {
    fn new(data: &'a [u8], count: Option<usize>, offset: &'a mut usize) -> Self {
        Self {
            data,
            count,
            offset,
            idx: 0,
        }
    }

    pub fn count(&self) -> Option<usize> {
        self.count.map(|c| c / D)
    }

    pub fn is_definite(&self) -> bool {
        self.count.is_some()
    }

    pub fn offset(&self) -> usize {
        *self.offset
    }

    fn check_for_end(&mut self) -> Result<bool, Error> {
        if let Some(count) = self.count {
            match self.idx.cmp(&count) {
                std::cmp::Ordering::Greater => Ok(true),
                std::cmp::Ordering::Equal => {
                    self.idx += 1;
                    Ok(true)
                }
                _ => Ok(false),
            }
        } else if *self.offset >= self.data.len() {
            Err(Error::NotEnoughData)
        } else if self.data[*self.offset] == 0xFF {
            if self.idx % D == 1 {
                Err(Error::PartialMap)
            } else {
                self.count = Some(self.idx);
                self.idx += 1;
                *self.offset += 1;
                Ok(true)
            }
        } else {
            Ok(false)
        }
    }

    /// Check for the end of the sequence, returning the offset just past it
    /// if no items remain.
    pub fn end(&mut self) -> Result<Option<usize>, Error> {
        if self.check_for_end()? {
            Ok(Some(*self.offset))
        } else {
            Ok(None)
        }
    }

    fn complete(mut self) -> Result<(), Error> {
        if !self.check_for_end()? {
            return Err(Error::MoreItems);
        }
        Ok(())
    }

    /// Skip the next value, returning its start offset, or `None` at the end
    /// of the sequence.
    pub fn skip_value(&mut self, max_recursion: usize) -> Result<Option<usize>, Error> {
        self.try_parse_value(|mut value, start, _| {
            value.skip(max_recursion)?;
            Ok(start)
        })
    }

    pub fn skip_to_end(&mut self, max_recursion: usize) -> Result<(), Error> {
        while self
            .try_parse_value(|mut value, _, _| value.skip(max_recursion))?
            .is_some()
        {
            if D == 2 {
                self.parse_value(|mut value, _, _| value.skip(max_recursion))?;
            }
        }
        Ok(())
    }

    pub fn try_parse_value<T, F, E>(&mut self, f: F) -> Result<Option<T>, E>
    where
        F: FnOnce(Value, usize, Vec<u64>) -> Result<T, E>,
        E: From<Error>,
    {
        if self.check_for_end()? {
            return Ok(None);
        }
        let item_start = *self.offset;
        match try_parse_value(&self.data[item_start..], |value, tags| {
            f(value, item_start, tags)
        })? {
            Some((value, len)) => {
                self.idx += 1;
                *self.offset += len;
                Ok(Some(value))
            }
            None => Err(Error::NotEnoughData.into()),
        }
    }

    pub fn parse_value<T, F, E>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(Value, usize, Vec<u64>) -> Result<T, E>,
        E: From<Error>,
    {
        self.try_parse_value(f)?
            .ok_or_else(|| Error::NotEnoughData.into())
    }

    pub fn try_parse<T>(&mut self) -> Result<Option<T>, T::Error>
    where
        T: FromCbor,
    {
        if self.check_for_end()? {
            return Ok(None);
        }
        let (value, len) = T::from_cbor(&self.data[*self.offset..])?;
        self.idx += 1;
        *self.offset += len;
        Ok(Some(value))
    }

    pub fn parse<T>(&mut self) -> Result<T, T::Error>
    where
        T: FromCbor,
    {
        self.try_parse::<T>()?
            .ok_or_else(|| Error::NotEnoughData.into())
    }

    pub fn parse_array<T, F, E>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Array, Vec<u64>) -> Result<T, E>,
        E: From<Error>,
    {
        self.parse_value(|value, _, tags| match value {
            Value::Array(a) => f(a, tags),
            value => Err(
                Error::IncorrectType("Array".to_string(), value.type_name(!tags.is_empty())).into(),
            ),
        })
    }
}

fn parse_tags(data: &[u8]) -> Result<(Vec<u64>, usize), Error> {
    let mut tags = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        match (data[offset] >> 5, data[offset] & 0x1F) {
            (6, minor) => {
                let (tag, o) = parse_uint_minor(minor, &data[offset + 1..])?;
                tags.push(tag);
                offset += o + 1;
            }
            _ => break,
        }
    }
    Ok((tags, offset))
}

fn to_array<const N: usize>(data: &[u8]) -> Result<[u8; N], Error> {
    if data.len() < N {
        Err(Error::NotEnoughData)
    } else {
        Ok(data[0..N].try_into().unwrap())
    }
}

fn parse_uint_minor(minor: u8, data: &[u8]) -> Result<(u64, usize), Error> {
    match minor {
        24 => {
            if data.is_empty() {
                Err(Error::NotEnoughData)
            } else {
                Ok((data[0] as u64, 1))
            }
        }
        25 => Ok((u16::from_be_bytes(to_array(data)?) as u64, 2)),
        26 => Ok((u32::from_be_bytes(to_array(data)?) as u64, 4)),
        27 => Ok((u64::from_be_bytes(to_array(data)?), 8)),
        val if val < 24 => Ok((val as u64, 0)),
        _ => Err(Error::InvalidMinorValue(minor)),
    }
}

fn parse_data_minor(minor: u8, data: &[u8]) -> Result<(&[u8], usize), Error> {
    let (data_len, len) = parse_uint_minor(minor, data)?;
    match (len as u64).checked_add(data_len) {
        Some(end) if end <= data.len() as u64 => {
            let end = end as usize;
            Ok((&data[len..end], end))
        }
        _ => Err(Error::NotEnoughData),
    }
}

fn parse_data_chunked(major: u8, data: &[u8]) -> Result<(Vec<&[u8]>, usize), Error> {
    let mut chunks = Vec::new();
    let mut offset = 0;
    loop {
        if offset >= data.len() {
            break Err(Error::NotEnoughData);
        }

        let v = data[offset];
        offset += 1;

        if v == 0xFF {
            break Ok((chunks, offset));
        }

        if v >> 5 != major || v & 0x1F == 31 {
            break Err(Error::InvalidChunk);
        }

        let (chunk, chunk_len) = parse_data_minor(v & 0x1F, &data[offset..])?;
        chunks.push(chunk);
        offset += chunk_len;
    }
}

pub fn try_parse_value<T, F, E>(data: &[u8], f: F) -> Result<Option<(T, usize)>, E>
where
    F: FnOnce(Value, Vec<u64>) -> Result<T, E>,
    E: From<Error>,
{
    let (tags, mut offset) = parse_tags(data)?;
    if offset >= data.len() {
        if !tags.is_empty() {
            return Err(Error::JustTags.into());
        }
        return Ok(None);
    }

    match (data[offset] >> 5, data[offset] & 0x1F) {
        (0, minor) => {
            let (v, len) = parse_uint_minor(minor, &data[offset + 1..])?;
            offset += len + 1;
            f(Value::UnsignedInteger(v), tags)
        }
        (1, minor) => {
            let (v, len) = parse_uint_minor(minor, &data[offset + 1..])?;
            offset += len + 1;
            f(Value::NegativeInteger(v), tags)
        }
        (2, 31) => {
            let (chunks, len) = parse_data_chunked(2, &data[offset + 1..])?;
            offset += len + 1;
            f(Value::ByteStream(chunks), tags)
        }
        (2, minor) => {
            let (t, len) = parse_data_minor(minor, &data[offset + 1..])?;
            offset += len + 1;
            f(Value::Bytes(t), tags)
        }
        (3, 31) => {
            let (chunks, len) = parse_data_chunked(3, &data[offset + 1..])?;
            let chunks = chunks
                .into_iter()
                .map(|c| std::str::from_utf8(c).map_err(Error::from))
                .collect::<Result<Vec<&str>, Error>>()?;
            offset += len + 1;
            f(Value::TextStream(chunks), tags)
        }
        (3, minor) => {
            let (t, len) = parse_data_minor(minor, &data[offset + 1..])?;
            offset += len + 1;
            f(
                Value::Text(std::str::from_utf8(t).map_err(Error::from)?),
                tags,
            )
        }
        (4, 31) => {
            offset += 1;
            let mut a = Array::new(data, None, &mut offset);
            let r = f(Value::Array(&mut a), tags)?;
            a.complete().map(|_| r).map_err(Into::into)
        }
        (4, minor) => {
            let (count, len) = parse_uint_minor(minor, &data[offset + 1..])?;
            offset += len + 1;
            if count > usize::MAX as u64 {
                return Err(Error::NotEnoughData.into());
            }
            let mut a = Array::new(data, Some(count as usize), &mut offset);
            let r = f(Value::Array(&mut a), tags)?;
            a.complete().map(|_| r).map_err(Into::into)
        }
        (5, 31) => {
            offset += 1;
            let mut m = Map::new(data, None, &mut offset);
            let r = f(Value::Map(&mut m), tags)?;
            m.complete().map(|_| r).map_err(Into::into)
        }
        (5, minor) => {
            let (count, len) = parse_uint_minor(minor, &data[offset + 1..])?;
            offset += len + 1;
            if count > (usize::MAX as u64) / 2 {
                return Err(Error::NotEnoughData.into());
            }
            let mut m = Map::new(data, Some((count * 2) as usize), &mut offset);
            let r = f(Value::Map(&mut m), tags)?;
            m.complete().map(|_| r).map_err(Into::into)
        }
        (6, _) => unreachable!(),
        (7, 20) => {
            offset += 1;
            f(Value::False, tags)
        }
        (7, 21) => {
            offset += 1;
            f(Value::True, tags)
        }
        (7, 22) => {
            offset += 1;
            f(Value::Null, tags)
        }
        (7, 23) => {
            offset += 1;
            f(Value::Undefined, tags)
        }
        (7, minor @ 0..=19) => {
            offset += 1;
            f(Value::Simple(minor), tags)
        }
        (7, 24) => {
            if data.len() <= offset + 1 {
                return Err(Error::NotEnoughData.into());
            }
            let v = data[offset + 1];
            if v < 32 {
                return Err(Error::InvalidSimpleType(v).into());
            }
            offset += 2;
            f(Value::Simple(v), tags)
        }
        (7, 25) => {
            let v = half::f16::from_be_bytes(to_array(&data[offset + 1..])?);
            offset += 3;
            f(Value::Float(v.into()), tags)
        }
        (7, 26) => {
            let v = f32::from_be_bytes(to_array(&data[offset + 1..])?);
            offset += 5;
            f(Value::Float(v.into()), tags)
        }
        (7, 27) => {
            let v = f64::from_be_bytes(to_array(&data[offset + 1..])?);
            offset += 9;
            f(Value::Float(v), tags)
        }
        (7, minor) => return Err(Error::InvalidSimpleType(minor).into()),
        (8.., _) => unreachable!(),
    }
    .map(|r| Some((r, offset)))
}

#[inline]
pub fn parse_value<T, F, E>(data: &[u8], f: F) -> Result<(T, usize), E>
where
    F: FnOnce(Value, Vec<u64>) -> Result<T, E>,
    E: From<Error>,
{
    try_parse_value(data, f)?.ok_or_else(|| Error::NotEnoughData.into())
}

pub fn parse_array<T, F, E>(data: &[u8], f: F) -> Result<(T, usize), E>
where
    F: FnOnce(&mut Array, Vec<u64>) -> Result<T, E>,
    E: From<Error>,
{
    parse_value(data, |value, tags| match value {
        Value::Array(a) => f(a, tags),
        value => {
            Err(Error::IncorrectType("Array".to_string(), value.type_name(!tags.is_empty())).into())
        }
    })
}

pub fn parse_map<T, F, E>(data: &[u8], f: F) -> Result<(T, usize), E>
where
    F: FnOnce(&mut Map, Vec<u64>) -> Result<T, E>,
    E: From<Error>,
{
    parse_value(data, |value, tags| match value {
        Value::Map(m) => f(m, tags),
        value => {
            Err(Error::IncorrectType("Map".to_string(), value.type_name(!tags.is_empty())).into())
        }
    })
}

pub fn parse<T>(data: &[u8]) -> Result<T, T::Error>
where
    T: FromCbor,
{
    T::from_cbor(data).map(|(v, _)| v)
}

impl FromCbor for u64 {
    type Error = self::Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, usize), Self::Error> {
        parse_value(data, |value, tags| match value {
            Value::UnsignedInteger(n) if tags.is_empty() => Ok(n),
            value => Err(Error::IncorrectType(
                "Untagged Unsigned Integer".to_string(),
                value.type_name(!tags.is_empty()),
            )),
        })
    }
}

macro_rules! uint_from_cbor {
    ($($t:ty),*) => {
        $(impl FromCbor for $t {
            type Error = self::Error;

            fn from_cbor(data: &[u8]) -> Result<(Self, usize), Self::Error> {
                let (v, len) = u64::from_cbor(data)?;
                Ok((v.try_into()?, len))
            }
        })*
    };
}

uint_from_cbor!(u8, u16, u32, usize);
