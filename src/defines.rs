//! Typed rows for the sample sheets: soldier properties, global properties,
//! item boxes and the newbie guide. JSON field names are the sheet column
//! names, so the same structs read both the CSV and the JSON exports.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::conv::{conv_to, parse_bool, parse_f32, parse_f64, parse_i32, parse_map, parse_slice, parse_u32};
use crate::csv_parse::{GDTable, Record};
use crate::error::Result;
use crate::schema::{cell, check_row_len, ParseFromRow, ParseKv, ParseRecord, ParseRow};

const ARRAY_DELIM: &str = "|";
const MAP_ITEM_DELIM: &str = "|";
const MAP_PAIR_DELIM: &str = "=";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
/// Soldier.xlsx
pub struct SoldierDefine {
    #[serde(rename = "ID")]
    pub id: i32,
    pub name: String,
    pub level: i32,
    pub building_name: String,
    pub building_level: i32,
    pub require_space: i32,
    pub volume: i32,
    pub upgrade_time: i32,
    pub upgrade_res: String,
    pub upgrade_cost: i32,
    pub consume_res: String,
    pub consume_cost: i32,
    pub consume_time: i32,
    pub act: i32,
    pub hp: i32,
    pub bomb_load: String,
    pub atk_frequency: f64,
    pub atk_range: f64,
    pub moving_speed: f64,
    pub enable_burn: String,
}

impl SoldierDefine {
    fn parse_with<'a>(get: impl Fn(&str) -> &'a str) -> Self {
        Self {
            id: parse_i32(get("ID")),
            name: get("Name").to_string(),
            level: parse_i32(get("Level")),
            building_name: get("BuildingName").to_string(),
            building_level: parse_i32(get("BuildingLevel")),
            require_space: parse_i32(get("RequireSpace")),
            volume: parse_i32(get("Volume")),
            upgrade_time: parse_i32(get("UpgradeTime")),
            upgrade_res: get("UpgradeRes").to_string(),
            upgrade_cost: parse_i32(get("UpgradeCost")),
            consume_res: get("ConsumeRes").to_string(),
            consume_cost: parse_i32(get("ConsumeCost")),
            consume_time: parse_i32(get("ConsumeTime")),
            act: parse_i32(get("Act")),
            hp: parse_i32(get("Hp")),
            bomb_load: get("BombLoad").to_string(),
            atk_frequency: parse_f64(get("AtkFrequency")),
            atk_range: parse_f64(get("AtkRange")),
            moving_speed: parse_f64(get("MovingSpeed")),
            enable_burn: get("EnableBurn").to_string(),
        }
    }
}

impl ParseRow for SoldierDefine {
    fn parse_row(table: &GDTable, row: usize) -> Result<Self> {
        Ok(Self::parse_with(|name| table.get_cell(name, row)))
    }
}

impl ParseRecord for SoldierDefine {
    fn parse_from(record: &Record) -> Result<Self> {
        Ok(Self::parse_with(|name| cell(record, name)))
    }
}

impl ParseFromRow for SoldierDefine {
    const FIELD_COUNT: usize = 20;
    fn parse_from_row(row: &[String]) -> Result<Self> {
        check_row_len("SoldierDefine", row, Self::FIELD_COUNT)?;
        Ok(Self {
            id: parse_i32(&row[0]),
            name: row[1].clone(),
            level: parse_i32(&row[2]),
            building_name: row[3].clone(),
            building_level: parse_i32(&row[4]),
            require_space: parse_i32(&row[5]),
            volume: parse_i32(&row[6]),
            upgrade_time: parse_i32(&row[7]),
            upgrade_res: row[8].clone(),
            upgrade_cost: parse_i32(&row[9]),
            consume_res: row[10].clone(),
            consume_cost: parse_i32(&row[11]),
            consume_time: parse_i32(&row[12]),
            act: parse_i32(&row[13]),
            hp: parse_i32(&row[14]),
            bomb_load: row[15].clone(),
            atk_frequency: parse_f64(&row[16]),
            atk_range: parse_f64(&row[17]),
            moving_speed: parse_f64(&row[18]),
            enable_burn: row[19].clone(),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
/// GlobalDefine.xlsx, a `Key`/`Type`/`Value` sheet describing one object.
pub struct GlobalDefine {
    pub gold_exchange_time_factor1: f32,
    pub gold_exchange_time_factor2: f32,
    pub gold_exchange_time_factor3: f32,
    pub gold_exchange_resource1_price: i32,
    pub gold_exchange_resource2_price: i32,
    pub gold_exchange_resource3_price: i32,
    pub gold_exchange_resource4_price: i32,
    pub free_complete_seconds: i32,
    pub cancel_build_return_percent: i32,
    pub enable_search: bool,
    pub spawn_level_limit: Vec<i32>,
    pub first_recharge_reward: HashMap<String, i32>,
    #[serde(rename = "VIPItemReward")]
    pub vip_item_reward: HashMap<i32, i32>,
}

impl ParseKv for GlobalDefine {
    fn parse_kv(map: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| map.get(key).map(String::as_str).unwrap_or("");
        Ok(Self {
            gold_exchange_time_factor1: parse_f32(get("GoldExchangeTimeFactor1")),
            gold_exchange_time_factor2: parse_f32(get("GoldExchangeTimeFactor2")),
            gold_exchange_time_factor3: parse_f32(get("GoldExchangeTimeFactor3")),
            gold_exchange_resource1_price: parse_i32(get("GoldExchangeResource1Price")),
            gold_exchange_resource2_price: parse_i32(get("GoldExchangeResource2Price")),
            gold_exchange_resource3_price: parse_i32(get("GoldExchangeResource3Price")),
            gold_exchange_resource4_price: parse_i32(get("GoldExchangeResource4Price")),
            free_complete_seconds: parse_i32(get("FreeCompleteSeconds")),
            cancel_build_return_percent: parse_i32(get("CancelBuildReturnPercent")),
            enable_search: parse_bool(get("EnableSearch")),
            spawn_level_limit: parse_slice(get("SpawnLevelLimit"), ARRAY_DELIM),
            first_recharge_reward: parse_map(get("FirstRechargeReward"), MAP_ITEM_DELIM, MAP_PAIR_DELIM),
            vip_item_reward: parse_map(get("VIPItemReward"), MAP_ITEM_DELIM, MAP_PAIR_DELIM),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProbabilityGoodsDefine {
    #[serde(rename = "GoodsID")]
    pub goods_id: String,
    pub num: u32,
    pub probability: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
/// ItemBox.xlsx. Each row carries repeated `GoodsID<n>`, `Num<n>`,
/// `Probability<n>` column groups, numbered from 1.
pub struct ItemBoxDefine {
    #[serde(rename = "ID")]
    pub id: String,
    pub total: i32,
    pub time: i32,
    pub repeat: bool,
    pub probability_goods: Vec<ProbabilityGoodsDefine>,
}

impl ItemBoxDefine {
    fn parse_with<'a>(has: impl Fn(&str) -> bool, get: impl Fn(&str) -> &'a str) -> Self {
        let mut goods = vec![];
        let mut i = 1;
        loop {
            let id_col = format!("GoodsID{i}");
            if !has(id_col.as_str()) {
                break;
            }
            let goods_id = get(id_col.as_str());
            if !goods_id.is_empty() {
                let num_col = format!("Num{i}");
                let prob_col = format!("Probability{i}");
                goods.push(ProbabilityGoodsDefine {
                    goods_id: goods_id.to_string(),
                    num: parse_u32(get(num_col.as_str())),
                    probability: parse_u32(get(prob_col.as_str())),
                });
            }
            i += 1;
        }
        Self {
            id: get("ID").to_string(),
            total: parse_i32(get("Total")),
            time: parse_i32(get("Time")),
            repeat: parse_bool(get("Repeat")),
            probability_goods: goods,
        }
    }
}

impl ParseRow for ItemBoxDefine {
    fn parse_row(table: &GDTable, row: usize) -> Result<Self> {
        Ok(Self::parse_with(
            |name| table.has_column(name),
            |name| table.get_cell(name, row),
        ))
    }
}

impl ParseRecord for ItemBoxDefine {
    fn parse_from(record: &Record) -> Result<Self> {
        Ok(Self::parse_with(
            |name| record.contains_key(name),
            |name| cell(record, name),
        ))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
/// NewbieGuide.xlsx
pub struct NewbieGuide {
    pub name: String,
    pub desc: String,
    pub category: i32,
    pub target: String,
    pub accomplishment: Vec<i32>,
    pub reward_goods: HashMap<String, i32>,
}

impl NewbieGuide {
    fn parse_with<'a>(get: impl Fn(&str) -> &'a str) -> Self {
        Self {
            name: get("Name").to_string(),
            desc: get("Desc").to_string(),
            category: conv_to(get("Category")),
            target: get("Target").to_string(),
            accomplishment: parse_slice(get("Accomplishment"), ARRAY_DELIM),
            reward_goods: parse_map(get("RewardGoods"), MAP_ITEM_DELIM, MAP_PAIR_DELIM),
        }
    }
}

impl ParseRow for NewbieGuide {
    fn parse_row(table: &GDTable, row: usize) -> Result<Self> {
        Ok(Self::parse_with(|name| table.get_cell(name, row)))
    }
}

impl ParseRecord for NewbieGuide {
    fn parse_from(record: &Record) -> Result<Self> {
        Ok(Self::parse_with(|name| cell(record, name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_parse::{read_csv_records, read_csv_table};

    #[test]
    fn soldier_by_name_and_position() {
        let data = "ID,Name,Level,BuildingName,BuildingLevel,RequireSpace,Volume,UpgradeTime,UpgradeRes,UpgradeCost,ConsumeRes,ConsumeCost,ConsumeTime,Act,Hp,BombLoad,AtkFrequency,AtkRange,MovingSpeed,EnableBurn\n\
                    101,Archer,2,Barracks,1,1,1,60,gold,100,food,20,30,1,120,1,1.5,5.5,2.25,false\n";
        let table = read_csv_table(data.as_bytes()).unwrap();
        let by_name = SoldierDefine::parse_row(&table, 0).unwrap();
        assert_eq!(by_name.id, 101);
        assert_eq!(by_name.building_name, "Barracks");
        assert_eq!(by_name.atk_range, 5.5);
        let by_pos = SoldierDefine::parse_from_row(table.get_row(0).unwrap()).unwrap();
        assert_eq!(by_name, by_pos);
    }

    #[test]
    fn global_from_kv() {
        let data = "Key,Type,Value\n\
                    GoldExchangeTimeFactor1,float,1.5\n\
                    EnableSearch,bool,on\n\
                    SpawnLevelLimit,int[],1|2|3\n\
                    FirstRechargeReward,\"<string,int>\",gold=100|gem=5\n\
                    VIPItemReward,\"<int,int>\",1=10|2=20\n";
        let table = read_csv_table(data.as_bytes()).unwrap();
        let conf = GlobalDefine::parse_kv(&table.to_kv_map().unwrap()).unwrap();
        assert_eq!(conf.gold_exchange_time_factor1, 1.5);
        assert!(conf.enable_search);
        assert_eq!(conf.spawn_level_limit, vec![1, 2, 3]);
        assert_eq!(conf.first_recharge_reward["gem"], 5);
        assert_eq!(conf.vip_item_reward[&2], 20);
        assert_eq!(conf.free_complete_seconds, 0);
    }

    #[test]
    fn item_box_groups() {
        let data = "ID,Total,Time,Repeat,GoodsID1,Num1,Probability1,GoodsID2,Num2,Probability2,GoodsID3,Num3,Probability3\n\
                    box1,10,1,yes,g1,5,50,,,,g3,1,10\n";
        let table = read_csv_table(data.as_bytes()).unwrap();
        let item = ItemBoxDefine::parse_row(&table, 0).unwrap();
        assert!(item.repeat);
        assert_eq!(item.probability_goods.len(), 2);
        assert_eq!(item.probability_goods[1].goods_id, "g3");
        let records = read_csv_records(data.as_bytes()).unwrap();
        assert_eq!(ItemBoxDefine::parse_from(&records[0]).unwrap(), item);
    }

    #[test]
    fn guide_json_names() {
        let guide = NewbieGuide {
            name: "intro".into(),
            accomplishment: vec![1],
            ..Default::default()
        };
        let json = serde_json::to_value(&guide).unwrap();
        assert_eq!(json["Name"], "intro");
        assert_eq!(json["Accomplishment"][0], 1);
        let back: NewbieGuide = serde_json::from_value(json).unwrap();
        assert_eq!(back, guide);
    }
}
