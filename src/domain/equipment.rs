// ==========================================
// 机台生产排程 - 设备标识
// ==========================================
// 说明: 设备主数据由外部维护，排程只透传身份信息，不参与计算
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentInfo {
    pub equipment_id: i64,
    pub equipment_no: String,
    pub machine_no: String,
    pub equipment_name: Option<String>,
    pub group_name: Option<String>,
    pub equipment_model: Option<String>,
}
