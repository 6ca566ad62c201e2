//! Heap page implementation: used-slot bitmap plus fixed-size tuple slots.
//!
//! Page layout:
//! ```text
//! +----------------------+
//! | Header bitmap        |  ceil(slots / 8) bytes, bit i = slot i used
//! +----------------------+  (LSB-first within each byte)
//! | Slot 0               |  schema.width() bytes each
//! | Slot 1               |
//! | ...                  |
//! +----------------------+
//! | Zero padding         |  up to PAGE_SIZE
//! +----------------------+
//! ```
//!
//! With row width W, `slots = (PAGE_SIZE * 8) / (W * 8 + 1)`: each slot
//! costs its row bytes plus one header bit.

use crate::schema::Schema;
use crate::tuple::{RecordId, Tuple};
use std::sync::Arc;
use tarn_common::{PageId, Result, TarnError, TransactionId, PAGE_SIZE};

/// One fixed-size page of a heap file, held in decoded form.
///
/// Used slots hold tuples of the page's schema, each tagged with its
/// RecordId. The dirty marker records the transaction that last mutated
/// the page; it travels with the in-memory image only and is never
/// serialized.
#[derive(Debug)]
pub struct HeapPage {
    pid: PageId,
    schema: Arc<Schema>,
    slots: Vec<Option<Tuple>>,
    dirty: Option<TransactionId>,
}

impl HeapPage {
    /// Number of tuple slots a page of the given schema holds.
    pub fn slots_per_page(schema: &Schema) -> usize {
        (PAGE_SIZE * 8) / (schema.width() * 8 + 1)
    }

    /// Size of the used-slot bitmap in bytes.
    pub fn header_size(schema: &Schema) -> usize {
        Self::slots_per_page(schema).div_ceil(8)
    }

    /// Creates an empty page (all slots free).
    pub fn empty(pid: PageId, schema: Arc<Schema>) -> Self {
        let slots = vec![None; Self::slots_per_page(&schema)];
        Self {
            pid,
            schema,
            slots,
            dirty: None,
        }
    }

    /// Decodes a page image of exactly PAGE_SIZE bytes.
    pub fn from_bytes(pid: PageId, schema: Arc<Schema>, data: &[u8]) -> Result<Self> {
        if data.len() != PAGE_SIZE {
            return Err(TarnError::BadPageSize(data.len(), PAGE_SIZE));
        }

        let num_slots = Self::slots_per_page(&schema);
        let header = Self::header_size(&schema);
        let width = schema.width();

        let mut slots = Vec::with_capacity(num_slots);
        for slot in 0..num_slots {
            if data[slot / 8] & (1 << (slot % 8)) == 0 {
                slots.push(None);
                continue;
            }
            let offset = header + slot * width;
            let mut cursor = &data[offset..offset + width];
            let mut tuple = Tuple::read_from(schema.clone(), &mut cursor)?;
            tuple.set_rid(Some(RecordId::new(pid, slot as u16)));
            slots.push(Some(tuple));
        }

        Ok(Self {
            pid,
            schema,
            slots,
            dirty: None,
        })
    }

    /// Re-serializes the page deterministically.
    ///
    /// Free slots and the tail padding are zeroed, so an unchanged page
    /// round-trips byte-for-byte.
    pub fn to_bytes(&self) -> [u8; PAGE_SIZE] {
        let header = Self::header_size(&self.schema);
        let width = self.schema.width();

        let mut data = [0u8; PAGE_SIZE];
        for (slot, tuple) in self.slots.iter().enumerate() {
            if let Some(tuple) = tuple {
                data[slot / 8] |= 1 << (slot % 8);
                let offset = header + slot * width;
                let mut cursor = &mut data[offset..offset + width];
                tuple.write_to(&mut cursor);
            }
        }
        data
    }

    /// Returns the page id.
    pub fn id(&self) -> PageId {
        self.pid
    }

    /// Returns the page's schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the total number of slots on the page.
    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of free slots.
    pub fn num_empty_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    /// Returns whether the given slot holds a tuple.
    pub fn slot_used(&self, slot: u16) -> bool {
        self.slots
            .get(slot as usize)
            .map(|s| s.is_some())
            .unwrap_or(false)
    }

    /// Returns the tuple in the given slot, if any.
    pub fn tuple(&self, slot: u16) -> Option<&Tuple> {
        self.slots.get(slot as usize).and_then(|s| s.as_ref())
    }

    /// Inserts a tuple into the lowest free slot and assigns its RecordId.
    ///
    /// Fails with `SchemaMismatch` if the tuple's schema differs from the
    /// page's, or `PageFull` if no slot is free.
    pub fn insert_tuple(&mut self, mut tuple: Tuple) -> Result<RecordId> {
        if tuple.schema().as_ref() != self.schema.as_ref() {
            return Err(TarnError::SchemaMismatch {
                expected: self.schema.type_desc(),
                actual: tuple.schema().type_desc(),
            });
        }
        let slot = self
            .slots
            .iter()
            .position(|s| s.is_none())
            .ok_or(TarnError::PageFull(self.pid))?;

        let rid = RecordId::new(self.pid, slot as u16);
        tuple.set_rid(Some(rid));
        self.slots[slot] = Some(tuple);
        Ok(rid)
    }

    /// Clears the slot addressed by `rid`.
    ///
    /// Fails with `TupleNotOnPage` if the RecordId names a different page
    /// or an empty slot.
    pub fn delete_tuple(&mut self, rid: RecordId) -> Result<()> {
        if rid.page_id != self.pid {
            return Err(TarnError::TupleNotOnPage(self.pid));
        }
        match self.slots.get_mut(rid.slot as usize) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                Ok(())
            }
            _ => Err(TarnError::TupleNotOnPage(self.pid)),
        }
    }

    /// Iterates over used slots in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.slots.iter().flatten()
    }

    /// Records or clears the dirty marker.
    pub fn mark_dirty(&mut self, tid: Option<TransactionId>) {
        self.dirty = tid;
    }

    /// Returns the transaction that last dirtied the page, if any.
    pub fn dirtied_by(&self) -> Option<TransactionId> {
        self.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::schema::Column;
    use crate::types::FieldType;

    fn int_text_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Column::new("a", FieldType::Int),
            Column::new("b", FieldType::Text),
        ]))
    }

    fn tuple(schema: &Arc<Schema>, a: i32, b: &str) -> Tuple {
        Tuple::new(schema.clone(), vec![Field::Int(a), Field::text(b)]).unwrap()
    }

    #[test]
    fn test_slot_math_for_int_text_rows() {
        // Row width 136: floor(32768 / 1089) slots, four header bytes.
        let schema = int_text_schema();
        assert_eq!(HeapPage::slots_per_page(&schema), 30);
        assert_eq!(HeapPage::header_size(&schema), 4);
    }

    #[test]
    fn test_slot_math_for_int_rows() {
        // Row width 4: floor(32768 / 33) = 992 slots, 124 header bytes.
        let schema = Arc::new(Schema::from_types([FieldType::Int]));
        assert_eq!(HeapPage::slots_per_page(&schema), 992);
        assert_eq!(HeapPage::header_size(&schema), 124);
    }

    #[test]
    fn test_empty_page() {
        let schema = int_text_schema();
        let page = HeapPage::empty(PageId::new(1, 0), schema.clone());
        assert_eq!(page.num_slots(), 30);
        assert_eq!(page.num_empty_slots(), 30);
        assert_eq!(page.iter().count(), 0);
        assert!(page.dirtied_by().is_none());
    }

    #[test]
    fn test_insert_assigns_lowest_free_slot() {
        let schema = int_text_schema();
        let mut page = HeapPage::empty(PageId::new(1, 0), schema.clone());

        let r0 = page.insert_tuple(tuple(&schema, 0, "x")).unwrap();
        let r1 = page.insert_tuple(tuple(&schema, 1, "y")).unwrap();
        assert_eq!(r0.slot, 0);
        assert_eq!(r1.slot, 1);

        page.delete_tuple(r0).unwrap();
        let r2 = page.insert_tuple(tuple(&schema, 2, "z")).unwrap();
        assert_eq!(r2.slot, 0, "freed slot 0 must be reused first");
    }

    #[test]
    fn test_insert_schema_mismatch() {
        let schema = int_text_schema();
        let mut page = HeapPage::empty(PageId::new(1, 0), schema);

        let other = Arc::new(Schema::from_types([FieldType::Int]));
        let t = Tuple::new(other, vec![Field::Int(1)]).unwrap();
        assert!(matches!(
            page.insert_tuple(t),
            Err(TarnError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_insert_until_full() {
        let schema = int_text_schema();
        let mut page = HeapPage::empty(PageId::new(1, 0), schema.clone());

        for i in 0..30 {
            page.insert_tuple(tuple(&schema, i, "t")).unwrap();
        }
        assert_eq!(page.num_empty_slots(), 0);
        assert!(matches!(
            page.insert_tuple(tuple(&schema, 99, "t")),
            Err(TarnError::PageFull(_))
        ));
    }

    #[test]
    fn test_delete_validations() {
        let schema = int_text_schema();
        let mut page = HeapPage::empty(PageId::new(1, 0), schema.clone());
        let rid = page.insert_tuple(tuple(&schema, 1, "x")).unwrap();

        // Wrong page
        let foreign = RecordId::new(PageId::new(1, 9), 0);
        assert!(matches!(
            page.delete_tuple(foreign),
            Err(TarnError::TupleNotOnPage(_))
        ));

        // Empty slot
        let empty = RecordId::new(PageId::new(1, 0), 5);
        assert!(matches!(
            page.delete_tuple(empty),
            Err(TarnError::TupleNotOnPage(_))
        ));

        page.delete_tuple(rid).unwrap();
        assert!(matches!(
            page.delete_tuple(rid),
            Err(TarnError::TupleNotOnPage(_))
        ));
    }

    #[test]
    fn test_iter_yields_used_slots_in_order_with_rids() {
        let schema = int_text_schema();
        let mut page = HeapPage::empty(PageId::new(2, 3), schema.clone());

        for i in 0..5 {
            page.insert_tuple(tuple(&schema, i, "t")).unwrap();
        }
        page.delete_tuple(RecordId::new(PageId::new(2, 3), 2)).unwrap();

        let collected: Vec<_> = page.iter().collect();
        assert_eq!(collected.len(), 4);
        let slots: Vec<_> = collected.iter().map(|t| t.rid().unwrap().slot).collect();
        assert_eq!(slots, vec![0, 1, 3, 4]);
        for t in collected {
            assert_eq!(t.rid().unwrap().page_id, PageId::new(2, 3));
        }
    }

    #[test]
    fn test_bitmap_matches_iteration() {
        let schema = int_text_schema();
        let mut page = HeapPage::empty(PageId::new(1, 0), schema.clone());
        for i in 0..7 {
            page.insert_tuple(tuple(&schema, i, "t")).unwrap();
        }
        page.delete_tuple(RecordId::new(PageId::new(1, 0), 3)).unwrap();

        let data = page.to_bytes();
        for slot in 0..page.num_slots() as u16 {
            let bit = data[slot as usize / 8] & (1 << (slot % 8)) != 0;
            assert_eq!(bit, page.slot_used(slot));
            assert_eq!(bit, page.tuple(slot).is_some());
        }
    }

    #[test]
    fn test_serialization_roundtrip_is_byte_stable() {
        let schema = int_text_schema();
        let mut page = HeapPage::empty(PageId::new(1, 0), schema.clone());
        for i in 0..10 {
            page.insert_tuple(tuple(&schema, i, &format!("row {}", i))).unwrap();
        }
        page.delete_tuple(RecordId::new(PageId::new(1, 0), 4)).unwrap();

        let first = page.to_bytes();
        let reloaded = HeapPage::from_bytes(PageId::new(1, 0), schema, &first).unwrap();
        let second = reloaded.to_bytes();
        assert_eq!(first.as_slice(), second.as_slice());
        assert_eq!(reloaded.num_empty_slots(), page.num_empty_slots());
    }

    #[test]
    fn test_from_bytes_rejects_wrong_length() {
        let schema = int_text_schema();
        let short = vec![0u8; PAGE_SIZE - 1];
        assert!(matches!(
            HeapPage::from_bytes(PageId::new(1, 0), schema, &short),
            Err(TarnError::BadPageSize(_, _))
        ));
    }

    #[test]
    fn test_dirty_marker() {
        let schema = int_text_schema();
        let mut page = HeapPage::empty(PageId::new(1, 0), schema);
        assert!(page.dirtied_by().is_none());

        let tid = TransactionId::new();
        page.mark_dirty(Some(tid));
        assert_eq!(page.dirtied_by(), Some(tid));

        page.mark_dirty(None);
        assert!(page.dirtied_by().is_none());
    }
}
