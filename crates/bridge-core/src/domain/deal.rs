//! 체결(Deal) 기록.
//!
//! 이 모듈은 게이트웨이 체결 관련 타입을 정의합니다:
//! - `Deal` - 정규화된 개별 체결 기록
//! - `DealAction` / `DealEntry` / `DealReason` - 게이트웨이 열거 코드 테이블
//! - `ModifyFlag` - 수정 플래그 비트마스크
//!
//! 열거 테이블은 게이트웨이 프로토콜 문서의 코드 배정을 그대로 따르며,
//! 직렬화 시 사람이 읽을 수 있는 이름으로 변환됩니다. 테이블에 없는
//! 코드는 원시 숫자 그대로 보존됩니다 (`Coded::Unknown`).

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 숫자 코드와 이름을 오가는 게이트웨이 열거 타입.
pub trait EnumCode: Sized + Copy {
    /// 코드에서 값을 디코딩합니다. 테이블에 없는 코드는 `None`.
    fn from_code(code: u32) -> Option<Self>;

    /// 사람이 읽을 수 있는 이름.
    fn name(&self) -> &'static str;

    /// 이름에서 값을 디코딩합니다.
    fn from_name(name: &str) -> Option<Self>;
}

/// 디코딩된 열거 값 또는 알 수 없는 원시 코드.
///
/// 게이트웨이가 테이블 밖의 코드를 보내더라도 체결을 버리지 않고
/// 원시 코드를 그대로 실어 나릅니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coded<T> {
    /// 테이블에 있는 값
    Known(T),
    /// 테이블에 없는 원시 코드
    Unknown(u32),
}

impl<T: EnumCode> Coded<T> {
    /// 원시 코드에서 디코딩합니다.
    pub fn from_code(code: u32) -> Self {
        match T::from_code(code) {
            Some(value) => Coded::Known(value),
            None => Coded::Unknown(code),
        }
    }

    /// 테이블에 있는 값이면 반환합니다.
    pub fn known(&self) -> Option<T> {
        match self {
            Coded::Known(value) => Some(*value),
            Coded::Unknown(_) => None,
        }
    }
}

impl<T: EnumCode> Serialize for Coded<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Coded::Known(value) => serializer.serialize_str(value.name()),
            Coded::Unknown(code) => serializer.serialize_u32(*code),
        }
    }
}

impl<'de, T: EnumCode> Deserialize<'de> for Coded<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CodedVisitor<T>(std::marker::PhantomData<T>);

        impl<T: EnumCode> Visitor<'_> for CodedVisitor<T> {
            type Value = Coded<T>;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "enum name string or numeric code")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                T::from_name(v)
                    .map(Coded::Known)
                    .ok_or_else(|| E::custom(format!("unknown enum name: {}", v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                let code = u32::try_from(v)
                    .map_err(|_| E::custom(format!("enum code out of range: {}", v)))?;
                Ok(Coded::from_code(code))
            }
        }

        deserializer.deserialize_any(CodedVisitor(std::marker::PhantomData))
    }
}

macro_rules! gateway_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($code:literal => $variant:ident = $label:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl EnumCode for $name {
            fn from_code(code: u32) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($label => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

gateway_enum! {
    /// 체결 동작 종류 (게이트웨이 코드 0–20).
    DealAction {
        0 => Buy = "Buy",
        1 => Sell = "Sell",
        2 => Balance = "Balance",
        3 => Credit = "Credit",
        4 => Charge = "Charge",
        5 => Correction = "Correction",
        6 => Bonus = "Bonus",
        7 => Commission = "Commission",
        8 => DailyCommission = "Daily Commission",
        9 => MonthlyCommission = "Monthly Commission",
        10 => DailyAgentCommission = "Daily Agent Commission",
        11 => MonthlyAgentCommission = "Monthly Agent Commission",
        12 => InterestRate = "Interest Rate",
        13 => BuyCanceled = "Buy Canceled",
        14 => SellCanceled = "Sell Canceled",
        15 => Dividend = "Dividend",
        16 => DividendFranked = "Dividend Franked",
        17 => Tax = "Tax",
        18 => Agent = "Agent",
        19 => StopOutCompensation = "Stop Out Compensation",
        20 => StopOutCompensationCredit = "Stop Out Compensation Credit",
    }
}

gateway_enum! {
    /// 체결 진입 방향 (게이트웨이 코드 0–3).
    DealEntry {
        0 => In = "Entry In",
        1 => Out = "Entry Out",
        2 => InOut = "Entry InOut",
        3 => OutBy = "Entry Out By",
    }
}

gateway_enum! {
    /// 체결 사유 (게이트웨이 코드 0–19).
    DealReason {
        0 => Client = "Client",
        1 => Expert = "Expert",
        2 => Dealer = "Dealer",
        3 => StopLoss = "Stop Loss",
        4 => TakeProfit = "Take Profit",
        5 => StopOut = "Stop Out",
        6 => Rollover = "Rollover",
        7 => ExternalClient = "External Client",
        8 => VariationMargin = "Variation Margin",
        9 => Gateway = "Gateway",
        10 => Signal = "Signal",
        11 => Settlement = "Settlement",
        12 => Transfer = "Transfer",
        13 => Sync = "Sync",
        14 => ExternalService = "External Service",
        15 => Migration = "Migration",
        16 => Mobile = "Mobile",
        17 => Web = "Web",
        18 => Split = "Split",
        19 => CorporateAction = "Corporate Action",
    }
}

/// 체결 수정 주체 플래그 (비트마스크).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifyFlag {
    /// 0x01 - 관리자
    Admin,
    /// 0x02 - 매니저
    Manager,
    /// 0x04 - 포지션 변경에 의한 수정
    Position,
    /// 0x08 - 복원
    Restore,
    /// 0x10 - API 관리자
    #[serde(rename = "API Admin")]
    ApiAdmin,
    /// 0x20 - API 매니저
    #[serde(rename = "API Manager")]
    ApiManager,
    /// 0x40 - API 서버
    #[serde(rename = "API Server")]
    ApiServer,
    /// 0x80 - API 게이트웨이
    #[serde(rename = "API Gateway")]
    ApiGateway,
}

impl ModifyFlag {
    const TABLE: [(u32, ModifyFlag); 8] = [
        (0x0000_0001, ModifyFlag::Admin),
        (0x0000_0002, ModifyFlag::Manager),
        (0x0000_0004, ModifyFlag::Position),
        (0x0000_0008, ModifyFlag::Restore),
        (0x0000_0010, ModifyFlag::ApiAdmin),
        (0x0000_0020, ModifyFlag::ApiManager),
        (0x0000_0040, ModifyFlag::ApiServer),
        (0x0000_0080, ModifyFlag::ApiGateway),
    ];

    /// 비트마스크를 설정된 플래그 목록으로 디코딩합니다 (비트 오름차순).
    pub fn decode(mask: u32) -> Vec<ModifyFlag> {
        Self::TABLE
            .iter()
            .filter(|(bit, _)| mask & bit != 0)
            .map(|(_, flag)| *flag)
            .collect()
    }
}

/// 정규화된 체결 기록.
///
/// 게이트웨이 원시 체결을 단일 변환 지점에서 정규화한 결과입니다.
/// 한 번 관측된 체결은 불변입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    /// 체결 티켓 번호
    pub ticket: u64,
    /// 계정 로그인
    pub login: u64,
    /// 관련 주문 번호
    pub order: u64,
    /// 외부 시스템 ID
    pub external_id: String,
    /// 딜러 로그인 (수동 처리 시)
    pub dealer: u64,
    /// 체결 동작
    pub action: Coded<DealAction>,
    /// 진입 방향
    pub entry: Coded<DealEntry>,
    /// 체결 사유
    pub reason: Coded<DealReason>,
    /// 가격 소수 자릿수
    pub digits: u32,
    /// 계약 크기
    pub contract_size: f64,
    /// 체결 시각
    pub time: DateTime<Utc>,
    /// 체결 시각 (밀리초 단위)
    pub time_msc: i64,
    /// 심볼
    pub symbol: String,
    /// 체결 가격
    pub price: f64,
    /// 손절 가격
    pub price_sl: f64,
    /// 익절 가격
    pub price_tp: f64,
    /// 포지션 가격
    pub price_position: f64,
    /// 게이트웨이(LP) 가격
    pub price_gateway: f64,
    /// 체결 수량 (랏)
    pub volume: f64,
    /// 청산된 수량
    pub volume_closed: f64,
    /// 손익
    pub profit: f64,
    /// 스왑 (게이트웨이 "storage")
    pub swap: f64,
    /// 수수료
    pub commission: f64,
    /// 기타 수수료
    pub fee: f64,
    /// 손익 통화 환율
    pub rate_profit: f64,
    /// 마진 통화 환율
    pub rate_margin: f64,
    /// EA ID
    pub expert_id: u64,
    /// 포지션 ID
    pub position_id: u64,
    /// 코멘트
    pub comment: String,
    /// 게이트웨이 이름
    pub gateway: String,
    /// 체결 시점 시장 매수 호가
    pub market_bid: f64,
    /// 체결 시점 시장 매도 호가
    pub market_ask: f64,
    /// 체결 시점 최종 체결가
    pub market_last: f64,
    /// 수정 주체 플래그
    pub modification_flags: Vec<ModifyFlag>,
}
