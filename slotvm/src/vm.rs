use crate::{ApiError, ApiSlots, InternedStrings, SlotType, Value};

#[derive(Debug, Clone)]
pub struct VMCreateInfo {
    /// slots available before the host calls `ensure_slots`
    pub initial_slots: usize,
    /// share a string table with another VM
    pub strings: Option<InternedStrings>,
}

impl Default for VMCreateInfo {
    fn default() -> Self {
        Self {
            initial_slots: 8,
            strings: None,
        }
    }
}

/// Handle the host embeds.
///
/// Owns the slot array of the current call frame. Every API call takes the VM
/// explicitly, so there is exactly one frame a call can touch.
#[derive(Debug)]
pub struct VM {
    pub(crate) slots: ApiSlots,
    strings: InternedStrings,
}

/// Aborts on API misuse.
#[track_caller]
pub(crate) fn fail_fast<T>(result: Result<T, ApiError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            log::error!("slot API contract violated: {err}");
            panic!("{err}")
        }
    }
}

impl VM {
    pub fn new(info: VMCreateInfo) -> Self {
        Self {
            slots: ApiSlots::with_count(info.initial_slots),
            strings: info.strings.unwrap_or_default(),
        }
    }

    pub fn strings(&self) -> &InternedStrings {
        &self.strings
    }

    pub fn slots(&self) -> &ApiSlots {
        &self.slots
    }

    pub fn ensure_slots(&mut self, count: usize) {
        self.slots.ensure(count);
    }

    pub fn get_slot_count(&self) -> usize {
        self.slots.count()
    }

    pub fn try_get_slot(&self, slot: i32) -> Result<&Value, ApiError> {
        let slot = self.slots.validate(slot)?;
        Ok(self.slots.get(slot))
    }

    #[track_caller]
    pub fn get_slot(&self, slot: i32) -> &Value {
        fail_fast(self.try_get_slot(slot))
    }

    pub fn try_get_slot_type(&self, slot: i32) -> Result<SlotType, ApiError> {
        self.try_get_slot(slot).map(Value::slot_type)
    }

    #[track_caller]
    pub fn get_slot_type(&self, slot: i32) -> SlotType {
        fail_fast(self.try_get_slot_type(slot))
    }

    pub fn try_set_slot(&mut self, slot: i32, value: Value) -> Result<(), ApiError> {
        let slot = self.slots.validate(slot)?;
        log::trace!("slot {slot} <- {:?}", value.slot_type());
        // undefined never crosses into host visible slots
        self.slots.set(slot, value.or_null());
        Ok(())
    }

    #[track_caller]
    pub fn set_slot_null(&mut self, slot: i32) {
        fail_fast(self.try_set_slot(slot, Value::Null))
    }

    #[track_caller]
    pub fn set_slot_bool(&mut self, slot: i32, value: bool) {
        fail_fast(self.try_set_slot(slot, Value::Bool(value)))
    }

    #[track_caller]
    pub fn set_slot_double(&mut self, slot: i32, value: f64) {
        fail_fast(self.try_set_slot(slot, Value::Num(value)))
    }

    pub fn try_set_slot_string(&mut self, slot: i32, text: &str) -> Result<(), ApiError> {
        let value = Value::Str(self.strings.intern(text));
        self.try_set_slot(slot, value)
    }

    #[track_caller]
    pub fn set_slot_string(&mut self, slot: i32, text: &str) {
        fail_fast(self.try_set_slot_string(slot, text))
    }

    fn typed_slot(&self, slot: i32, expected: SlotType) -> Result<&Value, ApiError> {
        let index = self.slots.validate(slot)?;
        let value = self.slots.get(index);
        let found = value.slot_type();
        if found != expected {
            return Err(ApiError::WrongSlotType {
                slot: index,
                expected,
                found,
            });
        }
        Ok(value)
    }

    pub fn try_get_slot_bool(&self, slot: i32) -> Result<bool, ApiError> {
        match self.typed_slot(slot, SlotType::Bool)? {
            Value::Bool(b) => Ok(*b),
            _ => unreachable!("slot type was checked"),
        }
    }

    #[track_caller]
    pub fn get_slot_bool(&self, slot: i32) -> bool {
        fail_fast(self.try_get_slot_bool(slot))
    }

    pub fn try_get_slot_double(&self, slot: i32) -> Result<f64, ApiError> {
        match self.typed_slot(slot, SlotType::Num)? {
            Value::Num(n) => Ok(*n),
            _ => unreachable!("slot type was checked"),
        }
    }

    #[track_caller]
    pub fn get_slot_double(&self, slot: i32) -> f64 {
        fail_fast(self.try_get_slot_double(slot))
    }

    pub fn try_get_slot_string(&self, slot: i32) -> Result<&str, ApiError> {
        match self.typed_slot(slot, SlotType::String)? {
            Value::Str(s) => Ok(&**s),
            _ => unreachable!("slot type was checked"),
        }
    }

    #[track_caller]
    pub fn get_slot_string(&self, slot: i32) -> &str {
        fail_fast(self.try_get_slot_string(slot))
    }

    pub fn try_copy_slot(&mut self, from: i32, to: i32) -> Result<(), ApiError> {
        let from = self.slots.validate(from)?;
        let to = self.slots.validate(to)?;
        let value = self.slots.get(from).clone();
        self.slots.set(to, value);
        Ok(())
    }

    #[track_caller]
    pub fn copy_slot(&mut self, from: i32, to: i32) {
        fail_fast(self.try_copy_slot(from, to))
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new(VMCreateInfo::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm_with_slots(count: usize) -> VM {
        VM::new(VMCreateInfo {
            initial_slots: count,
            ..Default::default()
        })
    }

    #[test]
    fn initial_slot_count_from_create_info() {
        assert_eq!(vm_with_slots(3).get_slot_count(), 3);
        assert_eq!(VM::default().get_slot_count(), 8);
    }

    #[test]
    fn ensure_slots_grows_frame() {
        let mut vm = vm_with_slots(1);
        vm.ensure_slots(5);
        assert_eq!(vm.get_slot_count(), 5);
        assert_eq!(vm.get_slot_type(4), SlotType::Null);
    }

    #[test]
    fn scalar_round_trips() {
        let mut vm = vm_with_slots(3);
        vm.set_slot_bool(0, true);
        vm.set_slot_double(1, 2.5);
        vm.set_slot_string(2, "text");

        assert!(vm.get_slot_bool(0));
        assert_eq!(vm.get_slot_double(1), 2.5);
        assert_eq!(vm.get_slot_string(2), "text");
        assert_eq!(vm.get_slot_type(0), SlotType::Bool);
        assert_eq!(vm.get_slot_type(1), SlotType::Num);
        assert_eq!(vm.get_slot_type(2), SlotType::String);

        vm.set_slot_null(2);
        assert_eq!(vm.get_slot_type(2), SlotType::Null);
    }

    #[test]
    fn strings_are_interned() {
        let mut vm = vm_with_slots(2);
        vm.set_slot_string(0, "same");
        vm.set_slot_string(1, "same");
        assert_eq!(vm.strings().len(), 1);
        assert_eq!(vm.get_slot(0), vm.get_slot(1));
    }

    #[test]
    fn shared_string_table() {
        let strings = InternedStrings::new();
        let mut a = VM::new(VMCreateInfo {
            initial_slots: 1,
            strings: Some(strings.clone()),
        });
        a.set_slot_string(0, "shared");
        assert_eq!(strings.len(), 1);
    }

    #[test]
    fn wrong_type_is_reported() {
        let mut vm = vm_with_slots(1);
        vm.set_slot_double(0, 1.0);
        assert_eq!(
            vm.try_get_slot_bool(0),
            Err(ApiError::WrongSlotType {
                slot: 0,
                expected: SlotType::Bool,
                found: SlotType::Num,
            })
        );
    }

    #[test]
    fn undefined_is_stored_as_null() {
        let mut vm = vm_with_slots(1);
        vm.try_set_slot(0, Value::Undefined).unwrap();
        assert_eq!(*vm.get_slot(0), Value::Null);
    }

    #[test]
    fn copy_slot_duplicates_value() {
        let mut vm = vm_with_slots(2);
        vm.set_slot_double(0, 7.0);
        vm.copy_slot(0, 1);
        assert_eq!(vm.get_slot_double(1), 7.0);
    }

    #[test]
    fn out_of_range_slot_is_an_error() {
        let mut vm = vm_with_slots(2);
        assert_eq!(
            vm.try_set_slot_string(2, "x"),
            Err(ApiError::SlotOutOfRange { slot: 2, count: 2 })
        );
        assert!(vm.try_get_slot_type(-1).is_err());
    }

    #[test]
    #[should_panic(expected = "Not that many slots")]
    fn setting_past_the_end_aborts() {
        let mut vm = vm_with_slots(1);
        vm.set_slot_bool(1, false);
    }

    #[test]
    #[should_panic(expected = "Slot cannot be negative")]
    fn negative_slot_aborts() {
        let vm = vm_with_slots(1);
        vm.get_slot_type(-3);
    }
}
