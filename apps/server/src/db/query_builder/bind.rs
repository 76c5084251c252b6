use super::BindValue;

pub(super) fn push_text(bind_params: &mut Vec<BindValue>, value: String) -> usize {
    bind_params.push(BindValue::Text(value));
    bind_params.len()
}

pub(super) fn push_text_array(bind_params: &mut Vec<BindValue>, value: Vec<String>) -> usize {
    bind_params.push(BindValue::TextArray(value));
    bind_params.len()
}

pub(super) fn push_bigint(bind_params: &mut Vec<BindValue>, value: i64) -> usize {
    bind_params.push(BindValue::BigInt(value));
    bind_params.len()
}

pub(super) fn push_bigint_array(bind_params: &mut Vec<BindValue>, value: Vec<i64>) -> usize {
    bind_params.push(BindValue::BigIntArray(value));
    bind_params.len()
}
