use serde::{de::Error, ser::SerializeSeq, Deserialize, Deserializer, Serializer};

use heapless::Vec as InlineVec;

/// Serializes a set of equally-sized memory banks as a single sequence of byte sequences.
pub(crate) fn serialize_slices_as_one<Sl: AsRef<[u8]>, Se: Serializer>(
    slices: &[Sl],
    ser: Se,
) -> Result<Se::Ok, Se::Error> {
    let mut seq = ser.serialize_seq(Some(slices.len()))?;
    slices
        .iter()
        .map(AsRef::as_ref)
        .try_for_each(|b| seq.serialize_element(b))
        .and_then(|()| seq.end())
}

/// The inverse of `serialize_slices_as_one`. Every bank must be present and exactly `N` bytes
/// long.
pub(crate) fn deserialize_slices_as_one<
    'de,
    const N: usize,
    const M: usize,
    De: Deserializer<'de>,
>(
    de: De,
) -> Result<[[u8; N]; M], De::Error> {
    let banks = InlineVec::<InlineVec<u8, N>, M>::deserialize(de)?;
    if banks.len() != M {
        return Err(De::Error::invalid_length(banks.len(), &"a full set of banks"));
    }
    let mut digest = [[0; N]; M];
    for (dst, src) in digest.iter_mut().zip(banks.iter()) {
        if src.len() != N {
            return Err(De::Error::invalid_length(src.len(), &"a full bank"));
        }
        dst.copy_from_slice(src);
    }
    Ok(digest)
}
