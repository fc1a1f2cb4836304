use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct RequestRealTimeData {
    pub sn: String,
    pub variables: Vec<String>,
}

#[derive(Deserialize)]
pub struct RealTimeData {
    pub variable: String,
    pub value: f64,
}

#[derive(Deserialize)]
pub struct RealTimeVariables {
    pub datas: Vec<RealTimeData>,
}

#[derive(Deserialize)]
pub struct DeviceRealTimeResult {
    pub result: Vec<RealTimeVariables>,
}

#[derive(Serialize)]
pub struct RequestSetDeviceSetting {
    pub sn: String,
    pub key: String,
    pub value: String,
}

#[derive(Serialize, Clone)]
pub struct SchedulerSegment {
    #[serde(rename = "enable")]
    pub enable: u8,
    #[serde(rename = "startHour")]
    pub start_hour: u8,
    #[serde(rename = "startMinute")]
    pub start_minute: u8,
    #[serde(rename = "endHour")]
    pub end_hour: u8,
    #[serde(rename = "endMinute")]
    pub end_minute: u8,
    #[serde(rename = "workMode")]
    pub work_mode: String,
    #[serde(rename = "fdSoc")]
    pub fd_soc: u8,
    #[serde(rename = "fdPwr")]
    pub fd_pwr: u32,
}

#[derive(Serialize)]
pub struct RequestSetScheduler {
    pub sn: String,
    pub groups: Vec<SchedulerSegment>,
}
