// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for CLI integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

/// In-process memcached speaking add/set/get/delete, ignoring expiry
#[derive(Clone)]
pub struct Memcached {
    pub addr: String,
    data: Arc<Mutex<HashMap<String, String>>>,
}

impl Memcached {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let data = Arc::new(Mutex::new(HashMap::new()));
        let shared = Arc::clone(&data);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let data = Arc::clone(&shared);
                thread::spawn(move || serve(stream, data));
            }
        });
        Self { addr, data }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

fn serve(stream: TcpStream, data: Arc<Mutex<HashMap<String, String>>>) {
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            return;
        }
        let parts: Vec<String> = line.split_whitespace().map(String::from).collect();
        let reply = match parts[0].as_str() {
            "add" | "set" => {
                let len: usize = parts[4].parse().unwrap();
                let mut buf = vec![0u8; len + 2];
                reader.read_exact(&mut buf).unwrap();
                let value = String::from_utf8(buf[..len].to_vec()).unwrap();
                let mut data = data.lock().unwrap();
                if parts[0] == "add" && data.contains_key(&parts[1]) {
                    "NOT_STORED\r\n".to_string()
                } else {
                    data.insert(parts[1].clone(), value);
                    "STORED\r\n".to_string()
                }
            }
            "get" => match data.lock().unwrap().get(&parts[1]) {
                Some(v) => format!("VALUE {} 0 {}\r\n{}\r\nEND\r\n", parts[1], v.len(), v),
                None => "END\r\n".to_string(),
            },
            "delete" => match data.lock().unwrap().remove(&parts[1]) {
                Some(_) => "DELETED\r\n".to_string(),
                None => "NOT_FOUND\r\n".to_string(),
            },
            _ => "ERROR\r\n".to_string(),
        };
        if writer.write_all(reply.as_bytes()).is_err() {
            return;
        }
    }
}

/// Address nothing listens on
pub fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().to_string()
}
