use criterion::{black_box, criterion_group, criterion_main, Criterion};
use esmshim_parser::Parser;

// A medium-size module mixing every declaration form with opaque code
const MODULE_SOURCE: &str = r#"
import React, { useState, useEffect as effect } from 'react';
import * as utils from './utils.js';
import './styles.js';

const DEFAULT_OPTIONS = {
    retries: 3,
    timeout: 1000,
    onError(err) { console.error(err); },
};

let counter = 0;

export const API_URL = 'https://example.com/api', VERSION = 2;
export const { host, port: listenPort } = parseAddress(API_URL);

export function fetchUser(id) {
    const url = `${API_URL}/users/${id}`;
    return fetch(url).then(res => res.json());
}

export async function* paginate(path) {
    let page = 0;
    while (true) {
        const items = await utils.get(`${path}?page=${page++}`);
        if (!items.length) return;
        yield* items;
    }
}

export class Store extends utils.Base {
    constructor() {
        super();
        this.items = new Map();
    }

    add(item) {
        this.items.set(item.id, item);
        counter++;
        return /^[a-z]+$/i.test(item.name);
    }
}

for (let i = 0; i < 10; i++) {
    counter += i;
}

function helper(a, b) {
    return a / b / 2;
}

export { helper, counter as count };
export { default as Button } from './button.js';
export * from './constants.js';
export * as icons from './icons.js';

export default function App() {
    const [state, setState] = useState(DEFAULT_OPTIONS);
    effect(() => setState({ ...state, ready: true }), []);
    return state;
}
"#;

fn bench_parse_module(c: &mut Criterion) {
    c.bench_function("parse_module", |b| {
        b.iter(|| {
            let parser = Parser::new(black_box(MODULE_SOURCE));
            parser.parse_program()
        });
    });
}

fn bench_parse_large_module(c: &mut Criterion) {
    let large_source = MODULE_SOURCE.repeat(50);
    c.bench_function("parse_large_module", |b| {
        b.iter(|| {
            let parser = Parser::new(black_box(&large_source));
            parser.parse_program()
        });
    });
}

criterion_group!(benches, bench_parse_module, bench_parse_large_module);
criterion_main!(benches);
