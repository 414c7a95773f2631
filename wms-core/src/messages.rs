//! User-facing message text
//!
//! Warehouse staff read these on the scan station and in the web UI, so
//! they stay in Thai. Log lines and error kinds remain English.

pub const NO_SUB_JOB: &str = "ไม่มี";
pub const ALL_SUB_JOBS: &str = "ทั้งหมด";
pub const UNKNOWN_JOB: &str = "ไม่ระบุ";

pub const STATUS_NEW: &str = "ใหม่";
pub const STATUS_NORMAL: &str = "ปกติ";

pub const EMPTY_BARCODE: &str = "กรุณากรอกบาร์โค้ด";
pub const NO_JOB_SELECTED: &str = "กรุณาเลือกประเภทงานหลักก่อน";
pub const SUB_JOB_MISMATCH: &str = "งานย่อยไม่ตรงกับงานหลักที่เลือก";
pub const NO_DATE: &str = "กรุณาระบุวันที่";
pub const INVALID_DATE_FORMAT: &str = "รูปแบบวันที่ไม่ถูกต้อง (ต้องเป็น YYYY-MM-DD)";
pub const DATE_RANGE_INVALID: &str = "วันที่เริ่มต้นต้องไม่เกินวันที่สิ้นสุด";
pub const INVALID_YEAR_MONTH: &str = "ปีหรือเดือนไม่ถูกต้อง";
pub const NO_IMPORT_DATA: &str = "ไม่มีข้อมูลให้นำเข้า";
pub const NO_VALID_DATA: &str = "ไม่มีข้อมูลที่ถูกต้องให้นำเข้า";
pub const NO_EXPORT_DATA: &str = "ไม่มีข้อมูลสำหรับส่งออก";
pub const LOGIN_INCOMPLETE: &str = "กรุณากรอกข้อมูลให้ครบถ้วน";
pub const LOGIN_FAILED: &str = "การทดสอบการเชื่อมต่อล้มเหลว";
pub const LOGIN_OK: &str = "เชื่อมต่อฐานข้อมูลสำเร็จ";
pub const LOGOUT_OK: &str = "ออกจากระบบสำเร็จ";
pub const LOGIN_REQUIRED: &str = "กรุณาเข้าสู่ระบบก่อน";
pub const RATE_LIMITED: &str = "มีการร้องขอมากเกินไป กรุณาลองใหม่ภายหลัง";
pub const INTERNAL_ERROR: &str = "เกิดข้อผิดพลาดภายในระบบ";
pub const UPDATE_OK: &str = "อัปเดตข้อมูลสำเร็จ";
pub const DELETE_OK: &str = "ลบข้อมูลสำเร็จ";
pub const DEPENDENCY_SELF: &str = "งานไม่สามารถขึ้นกับตัวเองได้";

pub fn scan_ok(barcode: &str) -> String {
    format!("บันทึกการสแกนบาร์โค้ด {} สำเร็จ", barcode)
}

pub fn duplicate_scan(barcode: &str, job_name: &str, sub_job_name: &str) -> String {
    format!(
        "บาร์โค้ด {} ถูกสแกนในงาน \"{} > {}\" แล้ว",
        barcode, job_name, sub_job_name
    )
}

/// Names every missing job, in the order given.
pub fn missing_dependencies<S: AsRef<str>>(job_names: &[S]) -> String {
    let quoted: Vec<String> = job_names
        .iter()
        .map(|n| format!("\"{}\"", n.as_ref()))
        .collect();
    format!("ต้องสแกนงาน {} ก่อน", quoted.join(", "))
}

pub fn job_not_found(id: i64) -> String {
    format!("ไม่พบงานหลักที่มี ID {}", id)
}

pub fn sub_job_not_found(id: i64) -> String {
    format!("ไม่พบงานย่อยที่มี ID {}", id)
}

pub fn sub_job_inactive(id: i64) -> String {
    format!("ประเภทงานย่อย ID {} ถูกปิดการใช้งาน", id)
}

pub fn sub_job_not_in_job(sub_job_id: i64, job_id: i64) -> String {
    format!(
        "ประเภทงานย่อย ID {} ไม่สัมพันธ์กับประเภทงานหลัก ID {}",
        sub_job_id, job_id
    )
}

pub fn job_name_taken(name: &str) -> String {
    format!("ประเภทงาน '{}' มีอยู่แล้ว", name)
}

pub fn sub_job_name_taken(name: &str) -> String {
    format!("ประเภทงานย่อย '{}' มีอยู่แล้วในงานหลักนี้", name)
}

pub fn job_in_use(name: &str, scans: i64) -> String {
    format!(
        "ไม่สามารถลบงาน '{}' ได้ เนื่องจากมีประวัติการสแกน {} รายการ",
        name, scans
    )
}

pub fn dependency_exists(job_name: &str, required_name: &str) -> String {
    format!("งาน '{}' ขึ้นกับงาน '{}' อยู่แล้ว", job_name, required_name)
}

pub fn dependency_cycle(job_name: &str, required_name: &str) -> String {
    format!(
        "ไม่สามารถกำหนดให้งาน '{}' ขึ้นกับงาน '{}' ได้ เพราะจะเกิดการขึ้นต่อกันแบบวงกลม",
        job_name, required_name
    )
}

pub fn validation_complete(valid: usize, invalid: usize) -> String {
    format!(
        "ตรวจสอบข้อมูลเสร็จสิ้น: ถูกต้อง {} แถว, ผิดพลาด {} แถว",
        valid, invalid
    )
}

pub fn import_complete(imported: usize, failed: usize) -> String {
    format!(
        "นำเข้าข้อมูลเสร็จสิ้น: สำเร็จ {} แถว, ล้มเหลว {} แถว",
        imported, failed
    )
}

pub fn report_ok(rows: usize) -> String {
    format!("รันรายงานสำเร็จ พบข้อมูล {} รายการ", rows)
}

pub fn record_not_found(resource: &str, id: &str) -> String {
    format!("ไม่พบข้อมูล {} '{}'", resource, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependencies_names_every_job() {
        let msg = missing_dependencies(&["1.Release", "2.Inprocess"]);
        assert_eq!(msg, "ต้องสแกนงาน \"1.Release\", \"2.Inprocess\" ก่อน");
    }

    #[test]
    fn duplicate_message_shows_job_path() {
        let msg = duplicate_scan("BC001", "4.Loading", NO_SUB_JOB);
        assert!(msg.contains("BC001"));
        assert!(msg.contains("\"4.Loading > ไม่มี\""));
    }
}
